// ── Enumerations ──
//
// The legacy client writes enum attributes by ordinal, the position of
// a member in its declared order. That order is therefore part of the
// wire contract: every enum type is registered once at startup with a
// fixed member list, and re-registering it with a different order is
// refused. Reordering a type's members is a breaking change for every
// connected client.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

use crate::error::BridgeError;

// ── EnumDescriptor ──────────────────────────────────────────────────

/// Declared members of one enum type, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumDescriptor {
    name: String,
    members: Vec<String>,
}

impl EnumDescriptor {
    pub fn new(
        name: impl Into<String>,
        members: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Arc<Self>, BridgeError> {
        let name = name.into();
        let members: Vec<String> = members.into_iter().map(Into::into).collect();

        for (i, member) in members.iter().enumerate() {
            if member.is_empty() {
                return Err(BridgeError::InvalidEnum {
                    name,
                    reason: format!("member {i} has an empty name"),
                });
            }
            if members[..i].contains(member) {
                return Err(BridgeError::InvalidEnum {
                    name,
                    reason: format!("duplicate member '{member}'"),
                });
            }
        }

        Ok(Arc::new(Self { name, members }))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn members(&self) -> &[String] {
        &self.members
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The member at `ordinal` in declaration order.
    pub fn at(self: &Arc<Self>, ordinal: usize) -> Option<EnumMember> {
        (ordinal < self.members.len()).then(|| EnumMember {
            descriptor: Arc::clone(self),
            ordinal,
        })
    }

    /// The member called `name`.
    pub fn member(self: &Arc<Self>, name: &str) -> Option<EnumMember> {
        let ordinal = self.members.iter().position(|m| m == name)?;
        self.at(ordinal)
    }
}

// ── EnumMember ──────────────────────────────────────────────────────

/// A native enum value. Carries its descriptor, so the declared order is
/// always reachable from the current value of an attribute.
#[derive(Clone)]
pub struct EnumMember {
    descriptor: Arc<EnumDescriptor>,
    ordinal: usize,
}

impl EnumMember {
    pub fn descriptor(&self) -> &Arc<EnumDescriptor> {
        &self.descriptor
    }

    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    pub fn name(&self) -> &str {
        &self.descriptor.members[self.ordinal]
    }
}

impl PartialEq for EnumMember {
    fn eq(&self, other: &Self) -> bool {
        self.ordinal == other.ordinal && self.descriptor.name == other.descriptor.name
    }
}

impl fmt::Debug for EnumMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.descriptor.name, self.name())
    }
}

impl fmt::Display for EnumMember {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ── EnumRegistry ────────────────────────────────────────────────────

/// Enum types known to a service. Filled during startup, read-only after.
#[derive(Debug, Default)]
pub struct EnumRegistry {
    by_name: DashMap<String, Arc<EnumDescriptor>>,
}

impl EnumRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an enum type. Registering the same declaration twice is a
    /// no-op; a different member list under the same name is refused.
    pub fn register(
        &self,
        name: &str,
        members: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Arc<EnumDescriptor>, BridgeError> {
        let descriptor = EnumDescriptor::new(name, members)?;
        match self.by_name.entry(name.to_owned()) {
            Entry::Occupied(existing) => {
                if existing.get().members == descriptor.members {
                    Ok(Arc::clone(existing.get()))
                } else {
                    Err(BridgeError::EnumRedefined { name: name.into() })
                }
            }
            Entry::Vacant(slot) => {
                tracing::debug!(name, members = descriptor.len(), "registered enum type");
                Ok(Arc::clone(slot.insert(descriptor).value()))
            }
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<EnumDescriptor>> {
        self.by_name.get(name).map(|r| Arc::clone(r.value()))
    }

    /// Look up `member` of the registered enum `enum_name`.
    pub fn member(&self, enum_name: &str, member: &str) -> Result<EnumMember, BridgeError> {
        let descriptor = self.get(enum_name).ok_or_else(|| BridgeError::UnknownEnum {
            name: enum_name.into(),
        })?;
        descriptor
            .member(member)
            .ok_or_else(|| BridgeError::mismatch(format!("member of {enum_name}"), member))
    }

    /// Check that `descriptor` is the type registered under its name.
    pub fn verify(&self, descriptor: &EnumDescriptor) -> Result<(), BridgeError> {
        match self.get(descriptor.name()) {
            Some(registered) if registered.members == descriptor.members => Ok(()),
            Some(_) => Err(BridgeError::EnumRedefined {
                name: descriptor.name().into(),
            }),
            None => Err(BridgeError::UnknownEnum {
                name: descriptor.name().into(),
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}
