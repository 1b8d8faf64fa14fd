// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Resolver registry: capability interface → registered variants.
//!
//! A [`Registry`] is assembled once through [`RegistryBuilder`] and is
//! immutable afterwards. It is `Send + Sync` and is handed to every decode
//! call by reference; there is no mutable global table.

use crate::decoder::Decoder;
use crate::error::DecodeError;
use rustc_hash::FxHashMap;
use serde_json::Value;
use std::any::{Any, TypeId};
use thiserror::Error;

/// An abstract capability whose concrete shape is picked per payload.
///
/// Implemented for trait objects (`dyn ConnectorTableHandle`) whose decoded
/// form is a `Box<dyn …>`, and for closed node families (`PlanNode`) whose
/// decoded form is the enum itself.
pub trait Interface: 'static {
    /// What a successful resolution produces.
    type Value: 'static;

    /// Diagnostic name, used in errors.
    const NAME: &'static str;

    /// Reserved payload key carrying the variant name, when the engine
    /// embeds one for this interface.
    const TAG_KEY: Option<&'static str> = None;
}

/// Decode function for one variant of `I`.
pub type DecodeFn<I> =
    fn(&Value, &mut Decoder<'_>) -> Result<<I as Interface>::Value, DecodeError>;

/// One registered variant of a capability interface.
pub struct VariantDef<I: Interface + ?Sized> {
    name: &'static str,
    tag: Option<&'static str>,
    signature: Option<&'static [&'static str]>,
    decode: DecodeFn<I>,
}

impl<I: Interface + ?Sized> VariantDef<I> {
    /// Variant selected by an explicit tag value.
    pub fn tagged(name: &'static str, tag: &'static str, decode: DecodeFn<I>) -> Self {
        Self {
            name,
            tag: Some(tag),
            signature: None,
            decode,
        }
    }

    /// Variant selected by its required-field signature.
    pub fn structural(
        name: &'static str,
        signature: &'static [&'static str],
        decode: DecodeFn<I>,
    ) -> Self {
        Self {
            name,
            tag: None,
            signature: Some(signature),
            decode,
        }
    }

    /// Add a structural signature to a tagged variant, making it reachable
    /// for payloads that omit the tag key.
    pub fn with_signature(mut self, signature: &'static [&'static str]) -> Self {
        self.signature = Some(signature);
        self
    }

    /// Variant name.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Explicit tag value, if any.
    pub fn tag(&self) -> Option<&'static str> {
        self.tag
    }

    /// Required-field signature, if any.
    pub fn signature(&self) -> Option<&'static [&'static str]> {
        self.signature
    }

    pub(crate) fn decode_fn(&self) -> DecodeFn<I> {
        self.decode
    }
}

// Manual impls: a derive would bound `I: Clone`, which trait objects are not.
impl<I: Interface + ?Sized> Clone for VariantDef<I> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tag: self.tag,
            signature: self.signature,
            decode: self.decode,
        }
    }
}

impl<I: Interface + ?Sized> std::fmt::Debug for VariantDef<I> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VariantDef")
            .field("interface", &I::NAME)
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("signature", &self.signature)
            .finish_non_exhaustive()
    }
}

/// All variants registered for one interface.
pub struct VariantTable<I: Interface + ?Sized> {
    variants: Vec<VariantDef<I>>,
    by_tag: FxHashMap<&'static str, usize>,
}

impl<I: Interface + ?Sized> VariantTable<I> {
    fn new() -> Self {
        Self {
            variants: Vec::new(),
            by_tag: FxHashMap::default(),
        }
    }

    /// Variants in registration order.
    pub fn variants(&self) -> &[VariantDef<I>] {
        &self.variants
    }

    /// Look up a variant by its explicit tag value.
    pub fn by_tag(&self, tag: &str) -> Option<&VariantDef<I>> {
        self.by_tag.get(tag).map(|&idx| &self.variants[idx])
    }

    /// Look up a variant by name.
    pub fn by_name(&self, name: &str) -> Option<&VariantDef<I>> {
        self.variants.iter().find(|v| v.name == name)
    }

    fn insert(&mut self, def: VariantDef<I>) -> Result<(), RegistryError> {
        if self.by_name(def.name).is_some() {
            return Err(RegistryError::DuplicateVariant {
                interface: I::NAME,
                variant: def.name,
            });
        }
        match (I::TAG_KEY, def.tag) {
            (None, Some(tag)) => {
                return Err(RegistryError::TagWithoutKey {
                    interface: I::NAME,
                    tag,
                });
            }
            (Some(_), None) => {
                return Err(RegistryError::MissingTag {
                    interface: I::NAME,
                    variant: def.name,
                });
            }
            (Some(_), Some(tag)) => {
                if self.by_tag.contains_key(tag) {
                    return Err(RegistryError::DuplicateTag {
                        interface: I::NAME,
                        tag,
                    });
                }
                self.by_tag.insert(tag, self.variants.len());
            }
            (None, None) => {}
        }
        self.variants.push(def);
        Ok(())
    }
}

/// Registry construction failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// Two variants of one interface share a name.
    #[error("{interface}: variant `{variant}` registered twice")]
    DuplicateVariant {
        /// Interface name.
        interface: &'static str,
        /// Variant name.
        variant: &'static str,
    },
    /// Two variants of one interface share a tag value.
    #[error("{interface}: tag `{tag}` registered twice")]
    DuplicateTag {
        /// Interface name.
        interface: &'static str,
        /// Tag value.
        tag: &'static str,
    },
    /// A tagged variant was registered on an interface without a tag key.
    #[error("{interface} has no tag key but variant tag `{tag}` was given")]
    TagWithoutKey {
        /// Interface name.
        interface: &'static str,
        /// Tag value.
        tag: &'static str,
    },
    /// A variant of a tagged interface was registered without a tag.
    #[error("{interface} is tagged but variant `{variant}` has no tag")]
    MissingTag {
        /// Interface name.
        interface: &'static str,
        /// Variant name.
        variant: &'static str,
    },
}

/// Immutable table of capability interfaces and their variants.
#[derive(Default)]
pub struct Registry {
    tables: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl Registry {
    /// Start assembling a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    /// Variant table for `I`, if any variant was registered for it.
    pub fn table<I: Interface + ?Sized>(&self) -> Option<&VariantTable<I>> {
        self.tables
            .get(&TypeId::of::<I>())
            .and_then(|t| t.downcast_ref::<VariantTable<I>>())
    }

    /// Number of interfaces with at least one variant.
    pub fn interface_count(&self) -> usize {
        self.tables.len()
    }
}

impl std::fmt::Debug for Registry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registry")
            .field("interfaces", &self.tables.len())
            .finish()
    }
}

/// Mutable staging area for a [`Registry`].
#[derive(Default)]
pub struct RegistryBuilder {
    tables: FxHashMap<TypeId, Box<dyn Any + Send + Sync>>,
}

impl std::fmt::Debug for RegistryBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistryBuilder")
            .field("interfaces", &self.tables.len())
            .finish()
    }
}

impl RegistryBuilder {
    /// Register one variant of `I`.
    pub fn register<I: Interface + ?Sized>(
        mut self,
        def: VariantDef<I>,
    ) -> Result<Self, RegistryError> {
        let slot = self
            .tables
            .entry(TypeId::of::<I>())
            .or_insert_with(|| Box::new(VariantTable::<I>::new()) as Box<dyn Any + Send + Sync>);
        // The slot was created under this TypeId, so the downcast always hits.
        if let Some(table) = slot.downcast_mut::<VariantTable<I>>() {
            table.insert(def)?;
        }
        Ok(self)
    }

    /// Register several variants of `I` in order.
    pub fn register_all<I: Interface + ?Sized>(
        self,
        defs: impl IntoIterator<Item = VariantDef<I>>,
    ) -> Result<Self, RegistryError> {
        defs.into_iter().try_fold(self, Self::register)
    }

    /// Freeze the registry.
    pub fn build(self) -> Registry {
        Registry {
            tables: self.tables,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Tagged;
    impl Interface for Tagged {
        type Value = u8;
        const NAME: &'static str = "Tagged";
        const TAG_KEY: Option<&'static str> = Some("@type");
    }

    struct Untagged;
    impl Interface for Untagged {
        type Value = u8;
        const NAME: &'static str = "Untagged";
    }

    fn one(_: &Value, _: &mut Decoder<'_>) -> Result<u8, DecodeError> {
        Ok(1)
    }

    #[test]
    fn duplicate_variant_name_is_rejected() {
        let err = Registry::builder()
            .register(VariantDef::<Untagged>::structural("a", &["x"], one))
            .and_then(|b| b.register(VariantDef::<Untagged>::structural("a", &["y"], one)))
            .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateVariant {
                interface: "Untagged",
                variant: "a"
            }
        );
    }

    #[test]
    fn duplicate_tag_is_rejected() {
        let err = Registry::builder()
            .register_all([
                VariantDef::<Tagged>::tagged("a", "t", one),
                VariantDef::<Tagged>::tagged("b", "t", one),
            ])
            .unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateTag { tag: "t", .. }));
    }

    #[test]
    fn tag_on_untagged_interface_is_rejected() {
        let err = Registry::builder()
            .register(VariantDef::<Untagged>::tagged("a", "t", one))
            .unwrap_err();
        assert!(matches!(err, RegistryError::TagWithoutKey { .. }));
    }

    #[test]
    fn untagged_variant_on_tagged_interface_is_rejected() {
        let err = Registry::builder()
            .register(VariantDef::<Tagged>::structural("a", &["x"], one))
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingTag { variant: "a", .. }));
    }

    #[test]
    fn tables_are_keyed_per_interface() {
        let registry = Registry::builder()
            .register(VariantDef::<Tagged>::tagged("a", "t", one))
            .and_then(|b| b.register(VariantDef::<Untagged>::structural("b", &[], one)))
            .unwrap()
            .build();
        assert_eq!(registry.interface_count(), 2);
        assert_eq!(registry.table::<Tagged>().unwrap().by_tag("t").unwrap().name(), "a");
        assert!(registry.table::<Tagged>().unwrap().by_name("b").is_none());
        assert_eq!(registry.table::<Untagged>().unwrap().variants().len(), 1);
    }
}
