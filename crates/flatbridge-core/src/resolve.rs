// ── Object resolution ──
//
// Walks an `AccessPath` against a live tree. Reads use `resolve`, which
// evaluates whatever it lands on. Writes use `resolve_parent` and then
// inspect the final slot with `Parent::slot`, which never runs the
// getter of the attribute about to be overwritten.
//
// The caller provides consistency: each function here borrows the root
// for the duration of one call and keeps nothing afterwards.

use std::borrow::Cow;

use crate::error::BridgeError;
use crate::model::{DataObject, Member, Method, TypeTag, Value};
use crate::path::{AccessPath, Segment};

// ── Read resolution ─────────────────────────────────────────────────

/// What a path points at.
#[derive(Debug, Clone)]
pub enum Resolved<'a> {
    /// A value. Borrowed from the tree, or owned when it was computed by
    /// a property getter somewhere along the path.
    Value(Cow<'a, Value>),
    Method(Method),
}

impl Resolved<'_> {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Value(v) => v.type_tag(),
            Self::Method(_) => TypeTag::Method,
        }
    }

    pub fn into_value(self) -> Option<Value> {
        match self {
            Self::Value(v) => Some(v.into_owned()),
            Self::Method(_) => None,
        }
    }
}

/// Resolve `path` against `root`, evaluating properties on the way.
pub fn resolve<'a>(root: &'a DataObject, path: &AccessPath) -> Result<Resolved<'a>, BridgeError> {
    let segments = path.segments();
    let mut current = root_member(root, &segments[0]).ok_or_else(|| not_found(path, 1))?;

    for (i, segment) in segments.iter().enumerate().skip(1) {
        current = match current {
            Resolved::Value(node) => step(node, segment),
            Resolved::Method(_) => None,
        }
        .ok_or_else(|| not_found(path, i + 1))?;
    }

    Ok(current)
}

fn root_member<'a>(root: &'a DataObject, segment: &Segment) -> Option<Resolved<'a>> {
    match segment {
        Segment::Attribute(name) => lookup_member(root, name),
        Segment::Index(_) | Segment::Key(_) => None,
    }
}

fn lookup_member<'a>(obj: &'a DataObject, name: &str) -> Option<Resolved<'a>> {
    Some(match obj.get(name)? {
        Member::Value(v) => Resolved::Value(Cow::Borrowed(v)),
        Member::Property(p) => Resolved::Value(Cow::Owned(p.get(obj))),
        Member::Method(m) => Resolved::Method(m.clone()),
    })
}

fn step<'a>(node: Cow<'a, Value>, segment: &Segment) -> Option<Resolved<'a>> {
    match node {
        Cow::Borrowed(value) => step_borrowed(value, segment),
        Cow::Owned(value) => step_owned(value, segment),
    }
}

fn step_borrowed<'a>(value: &'a Value, segment: &Segment) -> Option<Resolved<'a>> {
    match (value, segment) {
        (Value::Object(obj), Segment::Attribute(name)) => lookup_member(obj, name),
        (Value::Slider(slider), Segment::Attribute(name)) => {
            slider.field(name).map(Resolved::Value)
        }
        (Value::List(items), Segment::Index(i)) => {
            items.get(*i).map(|v| Resolved::Value(Cow::Borrowed(v)))
        }
        (Value::Dict(map), Segment::Key(key)) => {
            map.get(key).map(|v| Resolved::Value(Cow::Borrowed(v)))
        }
        _ => None,
    }
}

fn step_owned(value: Value, segment: &Segment) -> Option<Resolved<'static>> {
    let owned = |v: Value| Resolved::Value(Cow::Owned(v));
    match (value, segment) {
        (Value::Object(obj), Segment::Attribute(name)) => {
            lookup_member(&obj, name).map(|r| match r {
                Resolved::Value(v) => owned(v.into_owned()),
                Resolved::Method(m) => Resolved::Method(m),
            })
        }
        (Value::Slider(slider), Segment::Attribute(name)) => slider.into_field(name).map(owned),
        (Value::List(mut items), Segment::Index(i)) => {
            (*i < items.len()).then(|| owned(items.swap_remove(*i)))
        }
        (Value::Dict(mut map), Segment::Key(key)) => map.swap_remove(key).map(owned),
        _ => None,
    }
}

fn not_found(path: &AccessPath, len: usize) -> BridgeError {
    BridgeError::PathNotFound {
        prefix: path.render_prefix(len),
    }
}

// ── Parent resolution (writes) ──────────────────────────────────────

/// The container that holds the last segment of a path.
#[derive(Debug, Clone)]
pub enum Parent<'a> {
    /// The service root itself (single-segment paths).
    Root(&'a DataObject),
    /// A nested container. Owned when it sits behind a property getter,
    /// in which case writes into it have nowhere to go.
    Value(Cow<'a, Value>),
}

/// What the last segment of a path holds, seen without evaluating it.
#[derive(Debug, Clone)]
pub enum Slot<'a> {
    Stored(Cow<'a, Value>),
    /// Getter-backed attribute. Its value is deliberately not computed.
    Computed,
    Method,
}

impl Parent<'_> {
    pub fn type_tag(&self) -> TypeTag {
        match self {
            Self::Root(_) => TypeTag::Object,
            Self::Value(v) => v.type_tag(),
        }
    }

    /// Whether the parent is a computed copy rather than part of the tree.
    pub fn is_detached(&self) -> bool {
        matches!(self, Self::Value(Cow::Owned(_)))
    }

    /// Look at what `segment` holds in this parent without running getters.
    pub fn slot(&self, segment: &Segment) -> Option<Slot<'_>> {
        let value = match self {
            Self::Root(obj) => return object_slot(obj, segment),
            Self::Value(v) => v.as_ref(),
        };
        match (value, segment) {
            (Value::Object(obj), _) => object_slot(obj, segment),
            (Value::Slider(slider), Segment::Attribute(name)) => {
                slider.field(name).map(Slot::Stored)
            }
            (Value::List(items), Segment::Index(i)) => {
                items.get(*i).map(|v| Slot::Stored(Cow::Borrowed(v)))
            }
            (Value::Dict(map), Segment::Key(key)) => {
                map.get(key).map(|v| Slot::Stored(Cow::Borrowed(v)))
            }
            _ => None,
        }
    }
}

fn object_slot<'a>(obj: &'a DataObject, segment: &Segment) -> Option<Slot<'a>> {
    let Segment::Attribute(name) = segment else {
        return None;
    };
    Some(match obj.get(name)? {
        Member::Value(v) => Slot::Stored(Cow::Borrowed(v)),
        Member::Property(_) => Slot::Computed,
        Member::Method(_) => Slot::Method,
    })
}

/// Resolve everything but the last segment of `path`.
///
/// Returns the parent container together with the final segment so the
/// caller can decide how to apply it without walking the path again.
pub fn resolve_parent<'a, 'p>(
    root: &'a DataObject,
    path: &'p AccessPath,
) -> Result<(Parent<'a>, &'p Segment), BridgeError> {
    let last = path.last();
    let parents = path.parent_segments();
    if parents.is_empty() {
        return Ok((Parent::Root(root), last));
    }

    let parent_path = path.parent().ok_or_else(|| not_found(path, 1))?;
    match resolve(root, &parent_path)? {
        Resolved::Value(v) => Ok((Parent::Value(v), last)),
        Resolved::Method(_) => Err(not_found(path, path.len())),
    }
}

/// Resolve `path` and report whether the target is stored in the tree
/// (as opposed to computed, or sitting behind a computed parent).
///
/// The path is walked once, so every getter on it runs a single time.
pub fn resolve_with_origin<'a>(
    root: &'a DataObject,
    path: &AccessPath,
) -> Result<(Resolved<'a>, bool), BridgeError> {
    let (parent, last) = resolve_parent(root, path)?;
    let stored = !parent.is_detached() && matches!(parent.slot(last), Some(Slot::Stored(_)));
    let target = match parent {
        Parent::Root(obj) => root_member(obj, last),
        Parent::Value(node) => step(node, last),
    };
    target
        .map(|t| (t, stored))
        .ok_or_else(|| not_found(path, path.len()))
}

// ── Assignment ──────────────────────────────────────────────────────

/// Result of applying a value to the tree.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome {
    /// The value was stored; `previous` is what it replaced (`None` for a
    /// newly inserted mapping key).
    Assigned { previous: Option<Value> },
    /// The target is computed, a method, or sits behind a computed
    /// attribute. Nothing changed.
    ReadOnly,
}

enum StepMut<'a> {
    Found(&'a mut Value),
    ReadOnly,
    Missing,
}

/// Store `value` at `path`.
///
/// Stored attributes, sequence elements, mapping entries and slider
/// fields can be replaced; new attributes are never created. Targets
/// that cannot be stored into yield [`WriteOutcome::ReadOnly`].
pub fn assign(
    root: &mut DataObject,
    path: &AccessPath,
    value: Value,
) -> Result<WriteOutcome, BridgeError> {
    let parents = path.parent_segments();
    let last = path.last();

    let Some((first, rest)) = parents.split_first() else {
        return set_member(root, last, value, path);
    };

    let Segment::Attribute(first) = first else {
        return Err(not_found(path, 1));
    };
    let mut current = match root.get_mut(first) {
        Some(Member::Value(v)) => v,
        Some(Member::Property(_) | Member::Method(_)) => return Ok(WriteOutcome::ReadOnly),
        None => return Err(not_found(path, 1)),
    };

    for (i, segment) in rest.iter().enumerate() {
        current = match step_mut(current, segment) {
            StepMut::Found(v) => v,
            StepMut::ReadOnly => return Ok(WriteOutcome::ReadOnly),
            StepMut::Missing => return Err(not_found(path, i + 2)),
        };
    }

    set_child(current, last, value, path)
}

fn step_mut<'a>(value: &'a mut Value, segment: &Segment) -> StepMut<'a> {
    let found = match (value, segment) {
        (Value::Object(obj), Segment::Attribute(name)) => match obj.get_mut(name) {
            Some(Member::Value(v)) => Some(v),
            Some(Member::Property(_) | Member::Method(_)) => return StepMut::ReadOnly,
            None => None,
        },
        (Value::Slider(slider), Segment::Attribute(name)) if name == "value" => {
            Some(&mut *slider.value)
        }
        (Value::List(items), Segment::Index(i)) => items.get_mut(*i),
        (Value::Dict(map), Segment::Key(key)) => map.get_mut(key),
        _ => None,
    };
    found.map_or(StepMut::Missing, StepMut::Found)
}

fn set_member(
    obj: &mut DataObject,
    segment: &Segment,
    value: Value,
    path: &AccessPath,
) -> Result<WriteOutcome, BridgeError> {
    let Segment::Attribute(name) = segment else {
        return Err(not_found(path, path.len()));
    };
    match obj.get_mut(name) {
        Some(Member::Value(slot)) => Ok(WriteOutcome::Assigned {
            previous: Some(std::mem::replace(slot, value)),
        }),
        Some(Member::Property(_) | Member::Method(_)) => Ok(WriteOutcome::ReadOnly),
        None => Err(not_found(path, path.len())),
    }
}

fn set_child(
    parent: &mut Value,
    segment: &Segment,
    value: Value,
    path: &AccessPath,
) -> Result<WriteOutcome, BridgeError> {
    let previous = match (parent, segment) {
        (Value::Object(obj), _) => return set_member(obj, segment, value, path),
        (Value::Slider(slider), Segment::Attribute(name)) => slider.set_field(name, value)?,
        (Value::List(items), Segment::Index(i)) => items
            .get_mut(*i)
            .map(|slot| std::mem::replace(slot, value)),
        (Value::Dict(map), Segment::Key(key)) => {
            return Ok(WriteOutcome::Assigned {
                previous: map.insert(key.clone(), value),
            });
        }
        _ => None,
    };
    match previous {
        Some(previous) => Ok(WriteOutcome::Assigned {
            previous: Some(previous),
        }),
        None => Err(not_found(path, path.len())),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use indexmap::IndexMap;

    use super::*;
    use crate::model::{NumberSlider, Quantity};

    fn path(text: &str) -> AccessPath {
        AccessPath::parse(text).unwrap()
    }

    fn tree() -> DataObject {
        let mut gains = IndexMap::new();
        gains.insert("left".to_owned(), Value::Float(0.5));
        let panel = DataObject::new("Panel")
            .with_value("slider", NumberSlider::new(Quantity::new(1.0, "V"), 0.0, 5.0, 0.1))
            .with_value("gains", Value::Dict(gains));
        DataObject::new("Device")
            .with_value("panel", panel)
            .with_value("items", vec![1, 2, 3])
            .with_property("computed", |_| {
                Value::Object(DataObject::new("Inner").with_value("x", 7))
            })
            .with_method("reset", Vec::<String>::new(), |_| Ok(Value::None))
    }

    #[test]
    fn resolves_nested_values() {
        let root = tree();
        let v = resolve(&root, &path("items[1]")).unwrap().into_value();
        assert_eq!(v, Some(Value::Int(2)));
        let v = resolve(&root, &path("panel.gains[\"left\"]")).unwrap().into_value();
        assert_eq!(v, Some(Value::Float(0.5)));
        let v = resolve(&root, &path("panel.slider.max")).unwrap().into_value();
        assert_eq!(v, Some(Value::Float(5.0)));
    }

    #[test]
    fn resolves_through_computed_attributes() {
        let root = tree();
        let v = resolve(&root, &path("computed.x")).unwrap().into_value();
        assert_eq!(v, Some(Value::Int(7)));
    }

    #[test]
    fn resolves_methods() {
        let root = tree();
        assert!(matches!(
            resolve(&root, &path("reset")).unwrap(),
            Resolved::Method(_)
        ));
    }

    #[test]
    fn reports_failing_prefix() {
        let root = tree();
        for (text, prefix) in [
            ("missing", "missing"),
            ("items[3]", "items[3]"),
            ("panel.nope.deeper", "panel.nope"),
            ("panel.gains[\"right\"]", "panel.gains[\"right\"]"),
            ("items.len", "items.len"),
            ("reset.x", "reset.x"),
            ("[0]", "[0]"),
        ] {
            let err = resolve(&root, &path(text)).unwrap_err();
            assert_eq!(
                err,
                BridgeError::PathNotFound {
                    prefix: prefix.into()
                },
                "{text}"
            );
        }
    }

    #[test]
    fn parent_resolution_does_not_run_the_target_getter() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let root = DataObject::new("Device").with_property("expensive", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::Int(1)
        });

        let p = path("expensive");
        let (parent, last) = resolve_parent(&root, &p).unwrap();
        assert!(matches!(parent.slot(last), Some(Slot::Computed)));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn origin_is_reported_from_a_single_walk() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let root = tree().with_property("expensive", move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
            Value::Int(1)
        });

        let (value, stored) = resolve_with_origin(&root, &path("expensive")).unwrap();
        assert_eq!(value.into_value(), Some(Value::Int(1)));
        assert!(!stored);
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let (_, stored) = resolve_with_origin(&root, &path("panel.slider.max")).unwrap();
        assert!(stored);
        let (_, stored) = resolve_with_origin(&root, &path("computed.x")).unwrap();
        assert!(!stored);
    }

    #[test]
    fn parent_behind_getter_is_detached() {
        let root = tree();
        let p = path("computed.x");
        let (parent, _) = resolve_parent(&root, &p).unwrap();
        assert!(parent.is_detached());

        let p = path("panel.slider.value");
        let (parent, _) = resolve_parent(&root, &p).unwrap();
        assert!(!parent.is_detached());
        assert_eq!(parent.type_tag(), TypeTag::Slider);
    }

    #[test]
    fn assigns_stored_values() {
        let mut root = tree();
        let outcome = assign(&mut root, &path("items[0]"), Value::Int(10)).unwrap();
        assert_eq!(
            outcome,
            WriteOutcome::Assigned {
                previous: Some(Value::Int(1))
            }
        );
        let outcome = assign(
            &mut root,
            &path("panel.slider.value"),
            Value::Quantity(Quantity::new(2.0, "V")),
        )
        .unwrap();
        assert!(matches!(outcome, WriteOutcome::Assigned { .. }));
        assert_eq!(
            resolve(&root, &path("panel.slider.value")).unwrap().into_value(),
            Some(Value::Quantity(Quantity::new(2.0, "V")))
        );
        assert_eq!(
            resolve(&root, &path("items[0]")).unwrap().into_value(),
            Some(Value::Int(10))
        );
    }

    #[test]
    fn inserts_new_mapping_keys() {
        let mut root = tree();
        let outcome = assign(&mut root, &path("panel.gains[\"right\"]"), Value::Float(0.25)).unwrap();
        assert_eq!(outcome, WriteOutcome::Assigned { previous: None });
    }

    #[test]
    fn computed_targets_are_read_only() {
        let mut root = tree();
        assert_eq!(
            assign(&mut root, &path("computed"), Value::None).unwrap(),
            WriteOutcome::ReadOnly
        );
        assert_eq!(
            assign(&mut root, &path("computed.x"), Value::Int(1)).unwrap(),
            WriteOutcome::ReadOnly
        );
        assert_eq!(
            assign(&mut root, &path("reset"), Value::None).unwrap(),
            WriteOutcome::ReadOnly
        );
    }

    #[test]
    fn never_creates_attributes() {
        let mut root = tree();
        assert!(matches!(
            assign(&mut root, &path("brand_new"), Value::Int(1)),
            Err(BridgeError::PathNotFound { .. })
        ));
        assert!(matches!(
            assign(&mut root, &path("items[9]"), Value::Int(1)),
            Err(BridgeError::PathNotFound { .. })
        ));
    }
}
