use serde_json::{Map, Value};

/// Fields returned by `login` (`name_value_list`) minus the module list.
pub type UserInfo = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleInfo {
    /// Module key used in calls, e.g. `Accounts`.
    pub name: String,
    /// Translatable display label.
    pub label: String,
}

/// Modules available to the logged-in user, in the order the CRM listed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModuleCatalog {
    modules: Vec<ModuleInfo>,
}

impl ModuleCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a module; a module with the same name is replaced in place.
    pub fn insert(&mut self, module: ModuleInfo) {
        match self.modules.iter_mut().find(|it| it.name == module.name) {
            Some(existing) => *existing = module,
            None => self.modules.push(module),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ModuleInfo> {
        self.modules.iter().find(|it| it.name == name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ModuleInfo> {
        self.modules.iter()
    }
}

impl FromIterator<ModuleInfo> for ModuleCatalog {
    fn from_iter<I: IntoIterator<Item = ModuleInfo>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for module in iter {
            catalog.insert(module);
        }
        catalog
    }
}

impl<'a> IntoIterator for &'a ModuleCatalog {
    type Item = &'a ModuleInfo;
    type IntoIter = std::slice::Iter<'a, ModuleInfo>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// One `{name, value}` pair from an entry's `name_value_list`.
#[derive(Debug, Clone, PartialEq)]
pub struct EntryField {
    pub name: String,
    pub value: Value,
}
