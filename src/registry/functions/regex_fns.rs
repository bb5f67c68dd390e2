//! Counting and capture functions built on regular expressions

use crate::evaluator::EvaluationContext;
use crate::model::Value;
use crate::registry::function::{
    BuiltinFunction, FunctionError, FunctionRegistry, FunctionSignature,
};
use regex::Regex;

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::ranged("count", 1, 2),
        count,
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::ranged("rcount", 1, 2),
        rcount,
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("get_matches", 2),
        get_matches,
    )));
}

fn compile(pattern: &str) -> Result<Regex, FunctionError> {
    Regex::new(pattern).map_err(|e| FunctionError::InvalidRegex {
        pattern: pattern.to_string(),
        message: e.to_string(),
    })
}

/// One argument: element count of an array, or count of comma-separated
/// pieces of the string cast. Two arguments: non-overlapping occurrences of
/// the needle in the haystack.
fn count(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    let result = match args {
        [Value::Array(items)] => items.len(),
        [single] => single.as_str()?.split(',').count(),
        [needle, haystack] => {
            let needle = needle.as_str()?;
            if needle.is_empty() {
                0
            } else {
                haystack.as_str()?.matches(&needle).count()
            }
        }
        _ => unreachable!("arity is checked before dispatch"),
    };
    Ok(Value::Int(result as i64))
}

/// Like [`count`], but the two-argument form counts regex matches of the
/// first argument in the second
fn rcount(args: &[Value], ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    match args {
        [pattern, subject] => {
            let regex = compile(&pattern.as_str()?)?;
            let matches = regex.find_iter(&subject.as_str()?).count();
            Ok(Value::Int(matches as i64))
        }
        _ => count(args, ctx),
    }
}

/// First match of the pattern with capture groups
///
/// Index 0 is the whole match, subsequent indices the capture groups in
/// order; a group that did not participate yields `false`, and a pattern
/// that did not match at all yields an all-`false` array.
fn get_matches(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    let regex = compile(&args[0].as_str()?)?;
    let subject = args[1].as_str()?;
    let group_count = regex.captures_len();
    let groups = match regex.captures(&subject) {
        Some(captures) => (0..group_count)
            .map(|i| match captures.get(i) {
                Some(m) => Value::Str(m.as_str().to_string()),
                None => Value::Bool(false),
            })
            .collect(),
        None => vec![Value::Bool(false); group_count],
    };
    Ok(Value::Array(groups))
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

    #[test]
    fn count_single_argument() {
        assert_eq!(
            call_ok("count", &[Value::Array(vec![Value::Int(1), Value::Int(2)])]),
            Value::Int(2)
        );
        assert_eq!(call_ok("count", &[s("a,b,c")]), Value::Int(3));
        assert_eq!(call_ok("count", &[s("")]), Value::Int(1));
    }

    #[test]
    fn count_occurrences() {
        assert_eq!(call_ok("count", &[s("a"), s("banana")]), Value::Int(3));
        assert_eq!(call_ok("count", &[s(""), s("banana")]), Value::Int(0));
    }

    #[test]
    fn rcount_counts_regex_matches() {
        assert_eq!(call_ok("rcount", &[s("a+"), s("aa b aaa")]), Value::Int(2));
        assert_eq!(call_ok("rcount", &[s("x,y")]), Value::Int(2));
    }

    #[test]
    fn get_matches_returns_groups() {
        assert_eq!(
            call_ok("get_matches", &[s(r"(\w+)@(\w+)"), s("mail me at user@host now")]),
            Value::Array(vec![s("user@host"), s("user"), s("host")])
        );
        assert_eq!(
            call_ok("get_matches", &[s(r"(a)|(b)"), s("b")]),
            Value::Array(vec![s("b"), Value::Bool(false), s("b")])
        );
        assert_eq!(
            call_ok("get_matches", &[s("(x)"), s("no match here")]),
            Value::Array(vec![Value::Bool(false), Value::Bool(false)])
        );
    }

    #[test]
    fn invalid_patterns_are_reported() {
        assert!(matches!(
            call("rcount", &[s("("), s("x")]),
            Err(FunctionError::InvalidRegex { .. })
        ));
        assert!(matches!(
            call("get_matches", &[s("["), s("x")]),
            Err(FunctionError::InvalidRegex { .. })
        ));
    }
}
