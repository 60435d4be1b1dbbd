// ── Number slider widget ──
//
// The one composite widget kind: a bounded control wrapping a single
// scalar (plain number or quantity). Remote clients see the widget as a
// single value at its own path; only the inner `value` is writable from
// the wire.

use std::borrow::Cow;

use super::value::Value;
use crate::error::BridgeError;

#[derive(Debug, Clone, PartialEq)]
pub struct NumberSlider {
    pub value: Box<Value>,
    pub min: f64,
    pub max: f64,
    pub step_size: f64,
}

impl NumberSlider {
    pub fn new(value: impl Into<Value>, min: f64, max: f64, step_size: f64) -> Self {
        Self {
            value: Box::new(value.into()),
            min,
            max,
            step_size,
        }
    }

    /// Read a named field. `value` is borrowed, the bounds are copied out.
    pub fn field(&self, name: &str) -> Option<Cow<'_, Value>> {
        match name {
            "value" => Some(Cow::Borrowed(&*self.value)),
            "min" => Some(Cow::Owned(Value::Float(self.min))),
            "max" => Some(Cow::Owned(Value::Float(self.max))),
            "step_size" => Some(Cow::Owned(Value::Float(self.step_size))),
            _ => None,
        }
    }

    /// Owned variant of [`field`](Self::field).
    pub fn into_field(self, name: &str) -> Option<Value> {
        match name {
            "value" => Some(*self.value),
            _ => self.field(name).map(Cow::into_owned),
        }
    }

    /// Replace a named field, returning the previous value.
    pub fn set_field(&mut self, name: &str, new: Value) -> Result<Option<Value>, BridgeError> {
        let bound = match name {
            "value" => return Ok(Some(std::mem::replace(&mut *self.value, new))),
            "min" => &mut self.min,
            "max" => &mut self.max,
            "step_size" => &mut self.step_size,
            _ => return Ok(None),
        };
        let Some(number) = new.as_f64() else {
            return Err(BridgeError::mismatch("float", new.type_tag().as_ref()));
        };
        let previous = std::mem::replace(bound, number);
        Ok(Some(Value::Float(previous)))
    }
}
