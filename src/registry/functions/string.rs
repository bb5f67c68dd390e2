//! Plain string manipulation functions

use crate::evaluator::EvaluationContext;
use crate::model::Value;
use crate::registry::function::{
    BuiltinFunction, FunctionError, FunctionRegistry, FunctionSignature,
};

pub(super) fn register(registry: &mut FunctionRegistry) {
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("lcase", 1),
        lcase,
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("ucase", 1),
        ucase,
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("length", 1),
        length,
    )));
    // Alias kept for filters written against the older name
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("strlen", 1),
        length,
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::ranged("substr", 2, 3),
        substr,
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::ranged("strpos", 2, 3),
        strpos,
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("str_replace", 3),
        str_replace,
    )));
    registry.register(Box::new(BuiltinFunction::pure(
        FunctionSignature::fixed("rescape", 1),
        rescape,
    )));
}

fn lcase(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    Ok(Value::Str(args[0].as_str()?.to_lowercase()))
}

fn ucase(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    Ok(Value::Str(args[0].as_str()?.to_uppercase()))
}

/// Character count of the string cast, or element count for an array
fn length(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    let count = match &args[0] {
        Value::Array(items) => items.len(),
        other => other.as_str()?.chars().count(),
    };
    Ok(Value::Int(count as i64))
}

/// Character-based substring with negative start and length counting from
/// the end
fn substr(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    let source = args[0].as_str()?;
    let chars: Vec<char> = source.chars().collect();
    let len = chars.len() as i64;

    let mut start = args[1].as_int()?;
    if start < 0 {
        start = (len + start).max(0);
    }
    let start = start.min(len);

    let mut end = match args.get(2) {
        None => len,
        Some(length) => {
            let length = length.as_int()?;
            if length < 0 {
                // Negative length leaves that many characters off the end
                (len + length).max(start)
            } else {
                start.saturating_add(length).min(len)
            }
        }
    };
    if end < start {
        end = start;
    }
    Ok(Value::Str(
        chars[start as usize..end as usize].iter().collect(),
    ))
}

/// Character offset of the first occurrence of the needle, or -1
fn strpos(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    let haystack = args[0].as_str()?;
    let needle = args[1].as_str()?;
    let offset = match args.get(2) {
        Some(offset) => args_offset(offset)?,
        None => 0,
    };
    if needle.is_empty() {
        return Ok(Value::Int(-1));
    }
    let byte_offset = if offset == 0 {
        0
    } else {
        match haystack.char_indices().nth(offset) {
            Some((index, _)) => index,
            None => return Ok(Value::Int(-1)),
        }
    };
    match haystack[byte_offset..].find(&needle) {
        Some(found) => {
            let position = haystack[..byte_offset + found].chars().count();
            Ok(Value::Int(position as i64))
        }
        None => Ok(Value::Int(-1)),
    }
}

fn args_offset(value: &Value) -> Result<usize, FunctionError> {
    Ok(usize::try_from(value.as_int()?).unwrap_or(0))
}

fn str_replace(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    let subject = args[0].as_str()?;
    let search = args[1].as_str()?;
    let replace = args[2].as_str()?;
    if search.is_empty() {
        return Ok(Value::Str(subject));
    }
    Ok(Value::Str(subject.replace(&search, &replace)))
}

/// Escape regex metacharacters so the result matches the input literally
fn rescape(args: &[Value], _ctx: &mut EvaluationContext<'_>) -> Result<Value, FunctionError> {
    Ok(Value::Str(regex::escape(&args[0].as_str()?)))
}

#[cfg(test)]
mod tests {
    use super::super::testing::call_ok;
    use crate::model::Value;
    use pretty_assertions::assert_eq;

    fn s(text: &str) -> Value {
        Value::Str(text.into())
    }

    #[test]
    fn case_folding() {
        assert_eq!(call_ok("lcase", &[s("FooBar")]), s("foobar"));
        assert_eq!(call_ok("ucase", &[s("FooBar")]), s("FOOBAR"));
    }

    #[test]
    fn length_counts_characters_and_elements() {
        assert_eq!(call_ok("length", &[s("héllo")]), Value::Int(5));
        assert_eq!(call_ok("strlen", &[s("héllo")]), Value::Int(5));
        assert_eq!(
            call_ok("length", &[Value::Array(vec![Value::Int(1), Value::Int(2)])]),
            Value::Int(2)
        );
        // Non-strings go through the string cast
        assert_eq!(call_ok("length", &[Value::Int(1234)]), Value::Int(4));
    }

    #[test]
    fn substr_handles_negative_bounds() {
        assert_eq!(call_ok("substr", &[s("abcdef"), Value::Int(2)]), s("cdef"));
        assert_eq!(
            call_ok("substr", &[s("abcdef"), Value::Int(1), Value::Int(3)]),
            s("bcd")
        );
        assert_eq!(call_ok("substr", &[s("abcdef"), Value::Int(-2)]), s("ef"));
        assert_eq!(
            call_ok("substr", &[s("abcdef"), Value::Int(0), Value::Int(-2)]),
            s("abcd")
        );
        assert_eq!(call_ok("substr", &[s("abc"), Value::Int(10)]), s(""));
    }

    #[test]
    fn strpos_returns_minus_one_on_miss() {
        assert_eq!(call_ok("strpos", &[s("foobar"), s("bar")]), Value::Int(3));
        assert_eq!(call_ok("strpos", &[s("foobar"), s("xyz")]), Value::Int(-1));
        assert_eq!(call_ok("strpos", &[s("foobar"), s("")]), Value::Int(-1));
        assert_eq!(
            call_ok("strpos", &[s("abcabc"), s("a"), Value::Int(1)]),
            Value::Int(3)
        );
    }

    #[test]
    fn str_replace_replaces_all_occurrences() {
        assert_eq!(
            call_ok("str_replace", &[s("aXbXc"), s("X"), s("-")]),
            s("a-b-c")
        );
        assert_eq!(call_ok("str_replace", &[s("abc"), s(""), s("-")]), s("abc"));
    }

    #[test]
    fn rescape_neutralizes_metacharacters() {
        assert_eq!(call_ok("rescape", &[s("a.b*c")]), s(r"a\.b\*c"));
    }
}
