// ── Service objects ──
//
// A `DataObject` is a named bag of members. Members are stored values,
// computed (getter-backed) properties, or callable methods. Member
// order is declaration order and is preserved through serialization.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use super::tag::TypeTag;
use super::value::Value;
use crate::error::BridgeError;

type Getter = dyn Fn(&DataObject) -> Value + Send + Sync;
type Handler = dyn Fn(&[Value]) -> Result<Value, BridgeError> + Send + Sync;

// ── Property ────────────────────────────────────────────────────────

/// A read-only attribute computed on every access.
///
/// Getters may be expensive or talk to hardware, so they are only run
/// when a value is actually read, never while resolving a write.
#[derive(Clone)]
pub struct Property {
    getter: Arc<Getter>,
    doc: Option<String>,
}

impl Property {
    pub fn new(getter: impl Fn(&DataObject) -> Value + Send + Sync + 'static) -> Self {
        Self {
            getter: Arc::new(getter),
            doc: None,
        }
    }

    /// Run the getter against its owning object.
    pub fn get(&self, owner: &DataObject) -> Value {
        (self.getter)(owner)
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }
}

impl fmt::Debug for Property {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Property").field("doc", &self.doc).finish_non_exhaustive()
    }
}

// ── Method ──────────────────────────────────────────────────────────

/// A named positional parameter, optionally annotated with the kind of
/// value it expects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub name: String,
    pub annotation: Option<TypeTag>,
}

impl From<&str> for Parameter {
    fn from(name: &str) -> Self {
        Self {
            name: name.to_owned(),
            annotation: None,
        }
    }
}

impl From<String> for Parameter {
    fn from(name: String) -> Self {
        Self {
            name,
            annotation: None,
        }
    }
}

impl From<(&str, TypeTag)> for Parameter {
    fn from((name, annotation): (&str, TypeTag)) -> Self {
        Self {
            name: name.to_owned(),
            annotation: Some(annotation),
        }
    }
}

/// A callable member with named positional parameters.
#[derive(Clone)]
pub struct Method {
    name: String,
    parameters: Vec<Parameter>,
    handler: Arc<Handler>,
    doc: Option<String>,
}

impl Method {
    pub fn new(
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = impl Into<Parameter>>,
        handler: impl Fn(&[Value]) -> Result<Value, BridgeError> + Send + Sync + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            parameters: parameters.into_iter().map(Into::into).collect(),
            handler: Arc::new(handler),
            doc: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    /// `name(a, b)`, the form the legacy client uses to discover methods.
    pub fn signature(&self) -> String {
        let names: Vec<&str> = self.parameters.iter().map(|p| p.name.as_str()).collect();
        format!("{}({})", self.name, names.join(", "))
    }

    /// Invoke with positional arguments. Only the arity is checked here;
    /// argument types are the handler's business.
    pub fn call(&self, args: &[Value]) -> Result<Value, BridgeError> {
        if args.len() != self.parameters.len() {
            return Err(BridgeError::mismatch(
                format!("{} argument(s) for {}", self.parameters.len(), self.signature()),
                format!("{} argument(s)", args.len()),
            ));
        }
        (self.handler)(args)
    }
}

impl fmt::Debug for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Method")
            .field("signature", &self.signature())
            .finish_non_exhaustive()
    }
}

// ── Member ──────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub enum Member {
    Value(Value),
    Property(Property),
    Method(Method),
}

impl PartialEq for Member {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Value(a), Self::Value(b)) => a == b,
            (Self::Property(a), Self::Property(b)) => Arc::ptr_eq(&a.getter, &b.getter),
            (Self::Method(a), Self::Method(b)) => Arc::ptr_eq(&a.handler, &b.handler),
            _ => false,
        }
    }
}

// ── DataObject ──────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct DataObject {
    class_name: String,
    doc: Option<String>,
    members: IndexMap<String, Member>,
}

impl DataObject {
    pub fn new(class_name: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            doc: None,
            members: IndexMap::new(),
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn with_value(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.members.insert(name.into(), Member::Value(value.into()));
        self
    }

    pub fn with_property(
        mut self,
        name: impl Into<String>,
        getter: impl Fn(&DataObject) -> Value + Send + Sync + 'static,
    ) -> Self {
        self.members
            .insert(name.into(), Member::Property(Property::new(getter)));
        self
    }

    pub fn with_method(
        mut self,
        name: impl Into<String>,
        parameters: impl IntoIterator<Item = impl Into<Parameter>>,
        handler: impl Fn(&[Value]) -> Result<Value, BridgeError> + Send + Sync + 'static,
    ) -> Self {
        let name = name.into();
        let method = Method::new(name.clone(), parameters, handler);
        self.members.insert(name, Member::Method(method));
        self
    }

    /// Attach a doc string to an existing member.
    pub fn with_member_doc(mut self, name: &str, doc: impl Into<String>) -> Self {
        let doc = Some(doc.into());
        match self.members.get_mut(name) {
            Some(Member::Property(p)) => p.doc = doc,
            Some(Member::Method(m)) => m.doc = doc,
            Some(Member::Value(_)) | None => {}
        }
        self
    }

    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn doc(&self) -> Option<&str> {
        self.doc.as_deref()
    }

    pub fn get(&self, name: &str) -> Option<&Member> {
        self.members.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Member> {
        self.members.get_mut(name)
    }

    /// Stored value of `name`; `None` for properties, methods and unknown names.
    pub fn value(&self, name: &str) -> Option<&Value> {
        match self.members.get(name)? {
            Member::Value(v) => Some(v),
            Member::Property(_) | Member::Method(_) => None,
        }
    }

    pub fn members(&self) -> impl Iterator<Item = (&str, &Member)> {
        self.members.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }
}
