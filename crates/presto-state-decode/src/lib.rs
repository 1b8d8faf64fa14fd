// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Polymorphic decoding for coordinator-state payloads.
//!
//! Two pieces live here:
//!
//! - the **type resolver** ([`Registry`], [`VariantDef`], [`Interface`]), which
//!   maps an interface-typed JSON object to one registered variant, by an
//!   explicit tag when the engine embeds one and by field shape otherwise;
//! - the **tree decoder** ([`Decode`], [`Decoder`]), which walks a payload,
//!   delegates interface-typed fields to the resolver, and reports the first
//!   failure together with its path from the root.
//!
//! The crate never logs. Concrete model types and the standard registry live
//! in `presto-state-model`.
#![forbid(unsafe_code)]

pub mod decoder;
pub mod error;
pub mod outcome;
pub mod path;
pub mod registry;
mod resolve;
pub mod validate;

pub use decoder::{decode_slice, decode_str, decode_value, Decode, Decoder, Object};
pub use error::{DecodeError, DecodeErrorKind, ValidationError, ValidationReason, VariantRef};
pub use outcome::{decode_best_effort, BestEffort};
pub use path::{Path, PathSegment};
pub use registry::{DecodeFn, Interface, Registry, RegistryBuilder, RegistryError, VariantDef, VariantTable};
