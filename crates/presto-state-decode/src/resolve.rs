// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! Variant selection for interface-typed payloads.
//!
//! Selection order:
//!
//! 1. If the interface declares a tag key and the payload carries it, the
//!    tag value names the variant directly.
//! 2. Otherwise every variant with a structural signature is a candidate when
//!    all of its signature keys are present. Among candidates, only those
//!    whose signature is not a strict subset of another candidate's survive.
//!    Exactly one survivor is selected; several is an ambiguity; none means
//!    the payload is unknown.

use crate::decoder::{Decoder, Object};
use crate::error::{DecodeError, DecodeErrorKind, VariantRef};
use crate::registry::{Interface, VariantDef, VariantTable};
use serde_json::Value;

impl<I: Interface + ?Sized> VariantTable<I> {
    /// Pick the variant for `obj` without decoding it.
    pub fn select(&self, obj: &Object) -> Result<&VariantDef<I>, DecodeErrorKind> {
        if let Some(key) = I::TAG_KEY {
            if let Some(tag) = obj.get(key) {
                let tag = tag.as_str().ok_or_else(|| {
                    DecodeErrorKind::Malformed(format!("tag `{key}` must be a string"))
                })?;
                return self.by_tag(tag).ok_or_else(|| DecodeErrorKind::UnknownVariant {
                    interface: I::NAME,
                    detail: format!("{key} = {tag:?}"),
                });
            }
        }

        let candidates: Vec<(&VariantDef<I>, &[&str])> = self
            .variants()
            .iter()
            .filter_map(|def| def.signature().map(|sig| (def, sig)))
            .filter(|(_, sig)| sig.iter().all(|key| obj.contains_key(*key)))
            .collect();

        let maximal: Vec<&VariantDef<I>> = candidates
            .iter()
            .filter(|(_, sig)| {
                !candidates
                    .iter()
                    .any(|(_, other)| is_strict_superset(other, sig))
            })
            .map(|(def, _)| *def)
            .collect();

        match maximal.as_slice() {
            [only] => Ok(*only),
            [] => Err(DecodeErrorKind::UnknownVariant {
                interface: I::NAME,
                detail: describe_keys(obj),
            }),
            many => Err(DecodeErrorKind::AmbiguousVariant {
                interface: I::NAME,
                candidates: many.iter().map(|def| def.name()).collect(),
            }),
        }
    }
}

fn is_strict_superset(outer: &[&str], inner: &[&str]) -> bool {
    inner.iter().all(|key| outer.contains(key)) && outer.iter().any(|key| !inner.contains(key))
}

fn describe_keys(obj: &Object) -> String {
    let keys: Vec<&str> = obj.keys().map(String::as_str).collect();
    format!("keys [{}]", keys.join(", "))
}

pub(crate) fn resolve<I: Interface + ?Sized>(
    cx: &mut Decoder<'_>,
    value: &Value,
) -> Result<I::Value, DecodeError> {
    let obj = cx.object(value)?;
    let table = cx.registry().table::<I>().ok_or_else(|| {
        cx.error(DecodeErrorKind::UnknownVariant {
            interface: I::NAME,
            detail: "no variants registered".into(),
        })
    })?;
    let def = table.select(obj).map_err(|kind| cx.error(kind))?;
    let origin = VariantRef {
        interface: I::NAME,
        variant: def.name(),
    };
    let decode = def.decode_fn();
    decode(value, cx).map_err(|mut err| {
        if let DecodeErrorKind::Validation { variant, .. } = &mut err.kind {
            variant.get_or_insert(origin);
        }
        err
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decoder::decode_value;
    use crate::error::ValidationReason;
    use crate::registry::Registry;
    use crate::Decode;
    use serde_json::json;

    // A capability with three structural shapes: `b` extends `a`, `c` is
    // incomparable with `b`.
    struct Shape;
    impl Interface for Shape {
        type Value = &'static str;
        const NAME: &'static str = "Shape";
    }

    fn pick_a(_: &Value, _: &mut Decoder<'_>) -> Result<&'static str, DecodeError> {
        Ok("a")
    }
    fn pick_b(_: &Value, _: &mut Decoder<'_>) -> Result<&'static str, DecodeError> {
        Ok("b")
    }
    fn pick_c(v: &Value, cx: &mut Decoder<'_>) -> Result<&'static str, DecodeError> {
        let obj = cx.object(v)?;
        let _: u32 = cx.required(obj, "z")?;
        Ok("c")
    }

    fn shapes() -> Registry {
        Registry::builder()
            .register_all([
                VariantDef::<Shape>::structural("a", &["x"], pick_a),
                VariantDef::<Shape>::structural("b", &["x", "y"], pick_b),
                VariantDef::<Shape>::structural("c", &["x", "z"], pick_c),
            ])
            .unwrap()
            .build()
    }

    #[derive(Debug)]
    struct Wrapped(&'static str);
    impl Decode for Wrapped {
        fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
            cx.resolve::<Shape>(value).map(Wrapped)
        }
    }

    #[test]
    fn subset_match_picks_the_only_candidate() {
        let got: Wrapped = decode_value(&shapes(), &json!({"x": 1})).unwrap();
        assert_eq!(got.0, "a");
    }

    #[test]
    fn maximal_candidate_wins_over_its_subset() {
        let got: Wrapped = decode_value(&shapes(), &json!({"x": 1, "y": 2, "extra": 3})).unwrap();
        assert_eq!(got.0, "b");
    }

    #[test]
    fn incomparable_maximal_candidates_are_ambiguous() {
        let err = decode_value::<Wrapped>(&shapes(), &json!({"x": 1, "y": 2, "z": 3})).unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::AmbiguousVariant {
                interface: "Shape",
                candidates: vec!["b", "c"],
            }
        );
    }

    #[test]
    fn no_candidate_is_unknown() {
        let err = decode_value::<Wrapped>(&shapes(), &json!({"y": 2})).unwrap_err();
        assert!(matches!(
            err.kind,
            DecodeErrorKind::UnknownVariant { interface: "Shape", .. }
        ));
    }

    #[test]
    fn non_object_payload_is_malformed() {
        let err = decode_value::<Wrapped>(&shapes(), &json!("x")).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn validation_inside_variant_is_enriched() {
        let err = decode_value::<Wrapped>(&shapes(), &json!({"x": 1, "z": -4})).unwrap_err();
        match err.kind {
            DecodeErrorKind::Validation { error, variant } => {
                assert_eq!(error.reason, ValidationReason::Negative(-4));
                assert_eq!(
                    variant,
                    Some(VariantRef {
                        interface: "Shape",
                        variant: "c"
                    })
                );
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(err.path.to_string(), "z");
    }

    struct Node;
    impl Interface for Node {
        type Value = &'static str;
        const NAME: &'static str = "Node";
        const TAG_KEY: Option<&'static str> = Some("@type");
    }

    fn nodes() -> Registry {
        Registry::builder()
            .register_all([
                VariantDef::<Node>::tagged("filter", "filter", pick_a),
                VariantDef::<Node>::tagged("limit", "limit", pick_b).with_signature(&["count"]),
            ])
            .unwrap()
            .build()
    }

    #[derive(Debug)]
    struct TaggedNode(&'static str);
    impl Decode for TaggedNode {
        fn decode(value: &Value, cx: &mut Decoder<'_>) -> Result<Self, DecodeError> {
            cx.resolve::<Node>(value).map(TaggedNode)
        }
    }

    #[test]
    fn tag_selects_variant_regardless_of_shape() {
        let got: TaggedNode = decode_value(&nodes(), &json!({"@type": "filter", "count": 1})).unwrap();
        assert_eq!(got.0, "a");
    }

    #[test]
    fn unregistered_tag_is_unknown() {
        let err = decode_value::<TaggedNode>(&nodes(), &json!({"@type": "sort"})).unwrap_err();
        assert_eq!(
            err.kind,
            DecodeErrorKind::UnknownVariant {
                interface: "Node",
                detail: "@type = \"sort\"".into(),
            }
        );
    }

    #[test]
    fn missing_tag_falls_back_to_signatures() {
        let got: TaggedNode = decode_value(&nodes(), &json!({"count": 3})).unwrap();
        assert_eq!(got.0, "b");
        let err = decode_value::<TaggedNode>(&nodes(), &json!({"predicate": {}})).unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::UnknownVariant { .. }));
    }

    #[test]
    fn non_string_tag_is_malformed() {
        let err = decode_value::<TaggedNode>(&nodes(), &json!({"@type": 7})).unwrap_err();
        assert!(err.is_malformed());
    }

    #[test]
    fn empty_registry_reports_unknown_variant() {
        let err = decode_value::<Wrapped>(&Registry::default(), &json!({})).unwrap_err();
        assert!(matches!(err.kind, DecodeErrorKind::UnknownVariant { .. }));
    }
}
