//! Coercion probes and typed reads through the public API.

use chrono::{TimeZone, Utc};
use nebula_variant::{Scalar, TimeSpan, TypeCode, Variant, VariantError, VariantKind};
use num_bigint::BigInt;
use pretty_assertions::assert_eq;
use rstest::rstest;
use rust_decimal::Decimal;
use uuid::Uuid;

#[rstest]
#[case(Variant::from(2.0), Some(BigInt::from(2)))]
#[case(Variant::from(2.5), None)]
#[case(Variant::from("12345678901234567890123"), Some("12345678901234567890123".parse().unwrap()))]
#[case(Variant::from(u64::MAX), Some(BigInt::from(u64::MAX)))]
#[case(Variant::from("twelve"), None)]
#[case(Variant::null(), None)]
fn integer_probe(#[case] value: Variant, #[case] expected: Option<BigInt>) {
    assert_eq!(value.try_get_integer(), expected);
    assert_eq!(value.is_integer(), expected.is_some());
}

#[rstest]
#[case(Variant::from("SGVsbG8="), true)]
#[case(Variant::from("not base64!"), false)]
#[case(Variant::from(b"raw".to_vec()), true)]
#[case(Variant::array([Variant::from(1)]), true)]
#[case(Variant::object([("a", Variant::from(1))]), false)]
#[case(Variant::from(42), false)]
fn array_probe(#[case] value: Variant, #[case] expected: bool) {
    assert_eq!(value.is_array(), expected);
}

#[test]
fn guid_is_not_a_date_time() {
    let value = Variant::from(Uuid::from_u128(7));
    assert!(value.is_guid());
    assert!(!value.is_date_time());
    assert!(!value.is_time_span());
    assert!(value.is_string());
}

#[test]
fn numbers_are_never_flags_or_dates() {
    for value in [Variant::from(0), Variant::from(1), Variant::from(1.0)] {
        assert!(!value.is_boolean(), "{value}");
        assert!(!value.is_date_time(), "{value}");
        assert!(!value.is_time_span(), "{value}");
        assert!(!value.is_guid(), "{value}");
    }
}

#[test]
fn date_time_probe_normalises_to_utc() {
    let value = Variant::from("2021-06-01T12:00:00-03:00");
    assert_eq!(
        value.try_get_date_time(),
        Some(Utc.with_ymd_and_hms(2021, 6, 1, 15, 0, 0).unwrap())
    );
    assert_eq!(value.type_code(), TypeCode::DateTime);
}

#[test]
fn time_span_reads() {
    let value = Variant::from("1.02:03:04.5");
    let span = value.as_::<TimeSpan>().unwrap();
    assert_eq!(span.to_string(), "1.02:03:04.5000000");
    assert_eq!(Variant::from(span).kind(), VariantKind::TimeSpan);
}

#[test]
fn float_probe_prefers_decimal_for_text() {
    assert_eq!(
        Variant::from("0.1").try_get_float(),
        Some(Scalar::Decimal(Decimal::new(1, 1)))
    );
    assert_eq!(Variant::from(0.1).try_get_float(), Some(Scalar::F64(0.1)));
}

#[test]
fn conversion_failure_is_typed() {
    let err = Variant::from("abc").as_::<i32>().unwrap_err();
    assert!(matches!(
        err,
        VariantError::ConversionFailed {
            from: VariantKind::Primitive,
            ..
        }
    ));
}

#[test]
fn infinity_is_primitive_not_float() {
    let value = Variant::from(f64::INFINITY);
    assert_eq!(value.kind(), VariantKind::Primitive);
    assert!(value.is_float());
    assert!(!value.is_integer());
}

#[test]
fn undefined_is_null_like_but_distinct() {
    let undefined = Variant::undefined();
    assert!(undefined.is_null());
    assert_ne!(undefined, Variant::null());
    assert_eq!(undefined.as_::<i64>().unwrap(), 0);
}
