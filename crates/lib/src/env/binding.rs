use std::fmt;

use serde::Serialize;

/// A name/value pair exported into a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EnvBinding {
  pub name: String,
  pub value: String,
}

impl EnvBinding {
  pub fn new(name: &str, value: impl Into<String>) -> Self {
    Self {
      name: name.to_string(),
      value: value.into(),
    }
  }
}

impl fmt::Display for EnvBinding {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}={}", self.name, self.value)
  }
}

/// The bindings from one assembly, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct EnvBindings(Vec<EnvBinding>);

impl EnvBindings {
  pub(crate) fn push(&mut self, binding: EnvBinding) {
    self.0.push(binding);
  }

  pub fn get(&self, name: &str) -> Option<&str> {
    self.0.iter().find(|b| b.name == name).map(|b| b.value.as_str())
  }

  pub fn iter(&self) -> std::slice::Iter<'_, EnvBinding> {
    self.0.iter()
  }

  pub fn len(&self) -> usize {
    self.0.len()
  }

  pub fn is_empty(&self) -> bool {
    self.0.is_empty()
  }
}

impl<'a> IntoIterator for &'a EnvBindings {
  type Item = &'a EnvBinding;
  type IntoIter = std::slice::Iter<'a, EnvBinding>;

  fn into_iter(self) -> Self::IntoIter {
    self.0.iter()
  }
}
