//! IP address range checking

use crate::evaluator::EvaluationContext;
use crate::model::Value;
use crate::registry::function::{
    BuiltinFunction, FunctionError, FunctionRegistry, FunctionSignature,
};
use std::net::IpAddr;

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("ip_in_range", 2),
        ip_in_range,
    )));
}

/// Whether an address falls inside a range given as a CIDR block
/// (`192.0.2.0/24`), an explicit span (`192.0.2.1 - 192.0.2.9`) or a single
/// address
///
/// A malformed range is the filter author's mistake and reported as such; a
/// malformed subject address simply does not match.
fn ip_in_range(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    let subject = args[0].as_str()?;
    let range = args[1].as_str()?;
    let (lo, hi) = parse_range(&range)?;
    let Ok(address) = subject.trim().parse::<IpAddr>() else {
        return Ok(Value::Bool(false));
    };
    // Mixed address families never match
    if family(&address) != family(&lo) {
        return Ok(Value::Bool(false));
    }
    let needle = to_u128(address);
    Ok(Value::Bool(to_u128(lo) <= needle && needle <= to_u128(hi)))
}

fn parse_range(range: &str) -> Result<(IpAddr, IpAddr), FunctionError> {
    let invalid = || FunctionError::InvalidIpRange {
        range: range.to_string(),
    };
    let range = range.trim();

    if let Some((base, prefix)) = range.split_once('/') {
        let base: IpAddr = base.trim().parse().map_err(|_| invalid())?;
        let prefix: u32 = prefix.trim().parse().map_err(|_| invalid())?;
        let bits = family(&base);
        if prefix > bits {
            return Err(invalid());
        }
        let width_mask = if bits == 128 {
            u128::MAX
        } else {
            (1u128 << bits) - 1
        };
        let host_bits = bits - prefix;
        let mask = if host_bits >= 128 {
            0
        } else {
            (width_mask >> host_bits) << host_bits
        };
        let lo = to_u128(base) & mask;
        let hi = lo | (width_mask & !mask);
        return Ok((from_u128(lo, bits), from_u128(hi, bits)));
    }

    if let Some((lo, hi)) = range.split_once('-') {
        let lo: IpAddr = lo.trim().parse().map_err(|_| invalid())?;
        let hi: IpAddr = hi.trim().parse().map_err(|_| invalid())?;
        if family(&lo) != family(&hi) || to_u128(lo) > to_u128(hi) {
            return Err(invalid());
        }
        return Ok((lo, hi));
    }

    let exact: IpAddr = range.parse().map_err(|_| invalid())?;
    Ok((exact, exact))
}

fn family(address: &IpAddr) -> u32 {
    match address {
        IpAddr::V4(_) => 32,
        IpAddr::V6(_) => 128,
    }
}

fn to_u128(address: IpAddr) -> u128 {
    match address {
        IpAddr::V4(v4) => u32::from(v4) as u128,
        IpAddr::V6(v6) => u128::from(v6),
    }
}

fn from_u128(bits: u128, family: u32) -> IpAddr {
    if family == 32 {
        IpAddr::V4((bits as u32).into())
    } else {
        IpAddr::V6(bits.into())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::{call, call_ok};
    use crate::model::Value;
    use crate::registry::FunctionError;
    use pretty_assertions::assert_eq;

    fn s(text: &str) -> Value {
        Value::Str(text.into())
    }

    fn in_range(ip: &str, range: &str) -> Value {
        call_ok("ip_in_range", &[s(ip), s(range)])
    }

    #[test]
    fn cidr_blocks() {
        assert_eq!(in_range("192.0.2.55", "192.0.2.0/24"), Value::Bool(true));
        assert_eq!(in_range("192.0.3.1", "192.0.2.0/24"), Value::Bool(false));
        assert_eq!(in_range("10.1.2.3", "0.0.0.0/0"), Value::Bool(true));
        assert_eq!(in_range("2001:db8::1", "2001:db8::/32"), Value::Bool(true));
        assert_eq!(in_range("2001:db9::1", "2001:db8::/32"), Value::Bool(false));
    }

    #[test]
    fn explicit_spans_and_exact_addresses() {
        assert_eq!(
            in_range("192.0.2.5", "192.0.2.1 - 192.0.2.9"),
            Value::Bool(true)
        );
        assert_eq!(
            in_range("192.0.2.10", "192.0.2.1-192.0.2.9"),
            Value::Bool(false)
        );
        assert_eq!(in_range("192.0.2.7", "192.0.2.7"), Value::Bool(true));
    }

    #[test]
    fn mixed_families_never_match() {
        assert_eq!(in_range("2001:db8::1", "192.0.2.0/24"), Value::Bool(false));
    }

    #[test]
    fn bad_subject_is_false_but_bad_range_is_an_error() {
        assert_eq!(in_range("not-an-ip", "192.0.2.0/24"), Value::Bool(false));
        assert!(matches!(
            call("ip_in_range", &[s("192.0.2.1"), s("not-a-range")]),
            Err(FunctionError::InvalidIpRange { .. })
        ));
        assert!(matches!(
            call("ip_in_range", &[s("192.0.2.1"), s("192.0.2.0/99")]),
            Err(FunctionError::InvalidIpRange { .. })
        ));
    }
}
