use std::borrow::Cow;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt;
use std::fs;
use std::path::Path;

use hashbrown::HashMap;
use serde::Deserialize;

use crate::error::ZoneConfigError;

pub const DEFAULT_NAMESPACE: &str = "cavern";

/// `namespace:path` zone key. A bare `path` gets the default namespace.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(from = "String")]
pub struct ZoneId(Cow<'static, str>);

impl ZoneId {
    /// Fallback zone. Never selectable, even when registered.
    pub const EMPTY: ZoneId = ZoneId(Cow::Borrowed("cavern:void"));

    pub fn new(key: &str) -> Self {
        if key.contains(':') {
            ZoneId(Cow::Owned(key.to_string()))
        } else {
            ZoneId(Cow::Owned(format!("{DEFAULT_NAMESPACE}:{key}")))
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn namespace(&self) -> &str {
        self.0.split_once(':').map(|(ns, _)| ns).unwrap_or(DEFAULT_NAMESPACE)
    }

    pub fn path(&self) -> &str {
        self.0.split_once(':').map(|(_, p)| p).unwrap_or(&self.0)
    }

    pub fn is_empty_sentinel(&self) -> bool {
        *self == Self::EMPTY
    }
}

impl From<String> for ZoneId {
    fn from(s: String) -> Self {
        ZoneId::new(&s)
    }
}

impl From<&str> for ZoneId {
    fn from(s: &str) -> Self {
        ZoneId::new(s)
    }
}

impl fmt::Display for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for ZoneId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ZoneId({})", self.0)
    }
}

/// One registered zone, as written in `zones.toml`:
///
/// ```toml
/// [[zones]]
/// id = "crimson_hollows"
/// category = "nether"
/// weight = 1.5
/// edge = "crimson_fringe"
/// edge_size = 8
///
/// [[zones]]
/// id = "crimson_glade"
/// parent = "crimson_hollows"
/// weight = 0.4
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct ZoneDef {
    pub id: ZoneId,
    #[serde(default = "default_weight")]
    pub weight: f32,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub parent: Option<ZoneId>,
    #[serde(default)]
    pub edge: Option<ZoneId>,
    #[serde(default)]
    pub edge_size: i32,
    #[serde(default)]
    pub attributes: BTreeMap<String, toml::Value>,
}

fn default_weight() -> f32 {
    1.0
}

impl ZoneDef {
    pub fn new(id: impl Into<ZoneId>) -> Self {
        Self {
            id: id.into(),
            weight: 1.0,
            category: None,
            tags: Vec::new(),
            parent: None,
            edge: None,
            edge_size: 0,
            attributes: BTreeMap::new(),
        }
    }

    pub fn weight(mut self, weight: f32) -> Self {
        self.weight = weight;
        self
    }

    pub fn category(mut self, category: &str) -> Self {
        self.category = Some(category.to_string());
        self
    }

    pub fn tag(mut self, tag: &str) -> Self {
        self.tags.push(tag.to_string());
        self
    }

    pub fn parent(mut self, parent: impl Into<ZoneId>) -> Self {
        self.parent = Some(parent.into());
        self
    }

    pub fn edge(mut self, edge: impl Into<ZoneId>, size: i32) -> Self {
        self.edge = Some(edge.into());
        self.edge_size = size;
        self
    }
}

#[derive(Deserialize)]
struct ZonesFile {
    #[serde(default)]
    zones: Vec<ZoneDef>,
}

/// Registration-ordered zone definitions. Order is kept so rebuilt trees
/// assign the same handles.
#[derive(Clone, Debug, Default)]
pub struct ZoneRegistry {
    defs: Vec<ZoneDef>,
    by_id: HashMap<ZoneId, usize>,
}

impl ZoneRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, def: ZoneDef) -> Result<(), ZoneConfigError> {
        if !(def.weight.is_finite() && def.weight > 0.0) {
            return Err(ZoneConfigError::InvalidWeight {
                id: def.id.to_string(),
                weight: def.weight,
            });
        }
        if self.by_id.contains_key(&def.id) {
            return Err(ZoneConfigError::DuplicateZone(def.id.to_string()));
        }
        self.by_id.insert(def.id.clone(), self.defs.len());
        self.defs.push(def);
        Ok(())
    }

    pub fn get(&self, id: &ZoneId) -> Option<&ZoneDef> {
        self.by_id.get(id).map(|&i| &self.defs[i])
    }

    pub fn contains(&self, id: &ZoneId) -> bool {
        self.by_id.contains_key(id)
    }

    /// Adds or replaces a custom attribute. Returns false for unknown zones.
    pub fn add_attribute(&mut self, id: &ZoneId, key: &str, value: toml::Value) -> bool {
        match self.by_id.get(id) {
            Some(&i) => {
                self.defs[i].attributes.insert(key.to_string(), value);
                true
            }
            None => false,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &ZoneDef> {
        self.defs.iter()
    }

    pub fn len(&self) -> usize {
        self.defs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    pub fn from_toml_str(toml_str: &str) -> Result<Self, ZoneConfigError> {
        let file: ZonesFile = toml::from_str(toml_str)?;
        let mut reg = Self::new();
        for def in file.zones {
            reg.register(def)?;
        }
        Ok(reg)
    }

    pub fn load_from_path(path: &Path) -> Result<Self, Box<dyn Error>> {
        let s = fs::read_to_string(path)?;
        Ok(Self::from_toml_str(&s)?)
    }
}

/// Which registered zones a tree is built from. A zone is a member when its
/// category equals `category` or it carries one of `tags`; `include` adds ids
/// outright and `exclude` removes them, winning over everything else.
#[derive(Clone, Debug, Deserialize, PartialEq)]
pub struct ZoneFilter {
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default = "default_tags")]
    pub tags: Vec<String>,
    #[serde(default)]
    pub include: Vec<ZoneId>,
    #[serde(default)]
    pub exclude: Vec<ZoneId>,
}

fn default_category() -> String {
    "nether".to_string()
}
fn default_tags() -> Vec<String> {
    vec!["is_nether".to_string()]
}

impl Default for ZoneFilter {
    fn default() -> Self {
        Self {
            category: default_category(),
            tags: default_tags(),
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl ZoneFilter {
    pub fn accepts(&self, def: &ZoneDef) -> bool {
        if def.id.is_empty_sentinel() || self.exclude.contains(&def.id) {
            return false;
        }
        if self.include.contains(&def.id) {
            return true;
        }
        def.category.as_deref() == Some(self.category.as_str())
            || def.tags.iter().any(|t| self.tags.contains(t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_ids_get_default_namespace() {
        let id = ZoneId::new("ash_flats");
        assert_eq!(id.as_str(), "cavern:ash_flats");
        assert_eq!(id.namespace(), "cavern");
        assert_eq!(id.path(), "ash_flats");
        assert_eq!(ZoneId::new("other:ash_flats").namespace(), "other");
        assert!(ZoneId::new("void").is_empty_sentinel());
    }

    #[test]
    fn registry_from_toml() {
        let reg = ZoneRegistry::from_toml_str(
            r#"
            [[zones]]
            id = "crimson_hollows"
            category = "nether"
            weight = 1.5
            edge = "crimson_fringe"
            edge_size = 8
            attributes = { fog_density = 0.4 }

            [[zones]]
            id = "crimson_fringe"
        "#,
        )
        .unwrap();
        let def = reg.get(&ZoneId::new("crimson_hollows")).unwrap();
        assert_eq!(def.weight, 1.5);
        assert_eq!(def.edge, Some(ZoneId::new("crimson_fringe")));
        assert_eq!(def.edge_size, 8);
        assert_eq!(
            def.attributes.get("fog_density"),
            Some(&toml::Value::Float(0.4))
        );
        assert_eq!(reg.get(&ZoneId::new("crimson_fringe")).unwrap().weight, 1.0);
    }

    #[test]
    fn duplicates_and_bad_weights_are_rejected() {
        let mut reg = ZoneRegistry::new();
        reg.register(ZoneDef::new("a")).unwrap();
        assert!(matches!(
            reg.register(ZoneDef::new("a")),
            Err(ZoneConfigError::DuplicateZone(_))
        ));
        assert!(matches!(
            reg.register(ZoneDef::new("b").weight(0.0)),
            Err(ZoneConfigError::InvalidWeight { .. })
        ));
        assert!(matches!(
            reg.register(ZoneDef::new("c").weight(f32::NAN)),
            Err(ZoneConfigError::InvalidWeight { .. })
        ));
    }

    #[test]
    fn filter_membership() {
        let f = ZoneFilter {
            include: vec![ZoneId::new("special")],
            exclude: vec![ZoneId::new("banned")],
            ..ZoneFilter::default()
        };
        assert!(f.accepts(&ZoneDef::new("a").category("nether")));
        assert!(f.accepts(&ZoneDef::new("b").tag("is_nether")));
        assert!(!f.accepts(&ZoneDef::new("c").category("overworld")));
        assert!(f.accepts(&ZoneDef::new("special")));
        assert!(!f.accepts(&ZoneDef::new("banned").category("nether")));
        assert!(!f.accepts(&ZoneDef::new("void").category("nether")));
    }

    #[test]
    fn attributes_can_be_added_later() {
        let mut reg = ZoneRegistry::new();
        reg.register(ZoneDef::new("a")).unwrap();
        assert!(reg.add_attribute(&ZoneId::new("a"), "ambient", toml::Value::Boolean(true)));
        assert!(!reg.add_attribute(&ZoneId::new("missing"), "ambient", toml::Value::Boolean(true)));
        assert_eq!(reg.get(&ZoneId::new("a")).unwrap().attributes.len(), 1);
    }
}
