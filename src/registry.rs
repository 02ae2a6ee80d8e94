//! Explicit registry of the message types this process can decode.
//!
//! Nothing is registered behind the caller's back: a process builds its
//! registry with [`init`] (or registers types one by one) during startup and
//! hands it to whatever decodes frames.

use std::collections::BTreeMap;

use crate::error::{MalformedMessage, RegistryError};
use crate::message::{LoadRequest, LoadResponse, Message, MessageKind, WireMessage};
use crate::wire::Frame;

type BodyDecoder = fn(&[u8]) -> Result<Message, MalformedMessage>;

#[derive(Clone, Copy)]
struct RegisteredType {
    type_name: &'static str,
    decode: BodyDecoder,
}

#[derive(Clone, Default)]
pub struct TypeRegistry {
    types: BTreeMap<MessageKind, RegisteredType>,
}

fn decode_as<T>(body: &[u8]) -> Result<Message, MalformedMessage>
where
    T: WireMessage + Into<Message>,
{
    T::decode(body).map(Into::into)
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<T>(&mut self) -> Result<(), RegistryError>
    where
        T: WireMessage + Into<Message>,
    {
        if let Some(existing) = self.types.get(&T::KIND) {
            return Err(RegistryError::DuplicateKind {
                kind: T::KIND as u8,
                existing: existing.type_name,
            });
        }
        self.types.insert(
            T::KIND,
            RegisteredType {
                type_name: T::TYPE_NAME,
                decode: decode_as::<T>,
            },
        );
        tracing::debug!(kind = T::KIND as u8, type_name = T::TYPE_NAME, "registered message type");
        Ok(())
    }

    pub fn type_name(&self, kind: MessageKind) -> Option<&'static str> {
        self.types.get(&kind).map(|t| t.type_name)
    }

    /// Registered type names in kind order.
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.types.values().map(|t| t.type_name)
    }

    pub fn decode_body(&self, kind: MessageKind, body: &[u8]) -> Result<Message, MalformedMessage> {
        let registered = self
            .types
            .get(&kind)
            .ok_or(MalformedMessage::UnregisteredKind(kind as u8))?;
        (registered.decode)(body)
    }

    /// Host-facing string form of a framed message.
    pub fn describe(&self, frame: &[u8]) -> Result<String, MalformedMessage> {
        Ok(Frame::decode(frame, self)?.message.to_string())
    }
}

impl std::fmt::Debug for TypeRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.type_names()).finish()
    }
}

/// Registry with every load-protocol message type.
pub fn init() -> TypeRegistry {
    let mut registry = TypeRegistry::new();
    // Kinds are distinct constants; registration into a fresh registry cannot collide.
    let _ = registry.register::<LoadRequest>();
    let _ = registry.register::<LoadResponse>();
    registry
}
