use nom::branch::alt;
use nom::bytes::complete::{tag, tag_no_case};
use nom::character::complete::digit1;
use nom::combinator::rest;
use nom::sequence::tuple;
use nom::IResult as _IResult;

use crate::ParamMap;

type IResult<'a, T> = _IResult<&'a str, T>;

/// Splits a line on whitespace, but only at positions where the remaining
/// quote count is even. Inside an unbalanced quote the rest of the line is
/// one token, which is what the recovery rewrites key off of.
fn tokenize(line: &str) -> Vec<&str> {
    let total_quotes = line.matches('"').count();
    let mut tokens = vec![];
    let mut seen_quotes = 0;
    let mut start: Option<usize> = None;

    for (idx, c) in line.char_indices() {
        if c.is_whitespace() && (total_quotes - seen_quotes) % 2 == 0 {
            if let Some(s) = start.take() {
                tokens.push(&line[s..idx]);
            }
        } else {
            if c == '"' {
                seen_quotes += 1;
            }

            if start.is_none() {
                start = Some(idx);
            }
        }
    }

    if let Some(s) = start {
        tokens.push(&line[s..]);
    }

    tokens
}

enum GpuConditional<'a> {
    /// `GPU>=2?$key`, the high-capability branch.
    High(&'a str),
    /// `GPU<2?$key`, superseded by the high-capability declaration.
    Low,
}

fn gpu_conditional(i: &str) -> IResult<GpuConditional> {
    let (i, (_, cmp, _, _, key)) = tuple((
        tag_no_case("gpu"),
        alt((tag(">="), tag("<="), tag(">"), tag("<"))),
        digit1,
        tag("?"),
        rest,
    ))(i)?;

    if cmp.starts_with('<') {
        Ok((i, GpuConditional::Low))
    } else {
        Ok((i, GpuConditional::High(key)))
    }
}

// fix for: "$key""value""
fn split_after_first_quoted(line: &str) -> Option<String> {
    let first = line.find('"')?;
    let second = line[first + 1..].find('"')? + first + 1;

    Some(format!("{}\" {}", &line[..second], &line[second + 1..]))
}

/// Parses one line of key-value text into `params`.
///
/// First write wins within one document: a key already present is left
/// untouched, so re-parsing the same line is a no-op. Malformed lines get two
/// recovery attempts before being dropped without an error.
pub fn parse_parameter_line(line: &str, params: &mut ParamMap) {
    let words = tokenize(line);

    if words.is_empty() {
        return;
    }

    if words.len() == 1 {
        let quote_count = line.matches('"').count();

        // fix for: "$key""value""
        if quote_count == 4 {
            if let Some(rewritten) = split_after_first_quoted(line) {
                parse_parameter_line(&rewritten, params);
            }
        // fix for: $key"value"
        } else if quote_count == 2 {
            parse_parameter_line(&line.replace('"', ""), params);
        }

        // no recursive loops please
        return;
    }

    // fix for: "$key" "value" "$key2" "value2" on one physical line
    let next_line = if words.len() > 2 {
        Some(words[2..].join(" "))
    } else {
        None
    };

    let mut key = words[0].trim_matches('"').to_lowercase();

    if key.starts_with('/') {
        return;
    }

    // "GPU>=2?$detailtexture"
    if let Some(question_mark) = key.find('?') {
        println!(
            "~ WARNING: GPU-conditional parameter `{}`. Converted materials might need manual checking.",
            key
        );

        key = match gpu_conditional(key.as_str()) {
            Ok((_, GpuConditional::High(branch))) => branch.to_lowercase(),
            Ok((_, GpuConditional::Low)) => return,
            // not a GPU condition, best guess is whatever follows the `?`
            Err(_) => key[question_mark + 1..].to_string(),
        };
    }

    if !key.starts_with('$') && !key.contains("include") {
        return;
    }

    let value = words[1].trim_start_matches('\n').to_lowercase();
    // trailing line comments are not part of the value
    let value = value.split("//").next().unwrap_or("").to_string();

    params.entry(key).or_insert(value);

    if let Some(next_line) = next_line {
        parse_parameter_line(&next_line, params);
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::ParamMap;

    fn parse(line: &str) -> ParamMap {
        let mut params = ParamMap::new();
        parse_parameter_line(line, &mut params);
        params
    }

    #[test]
    fn simple_pair() {
        let params = parse("\"$basetexture\" \"brick/brickwall031d\"");

        // values keep their quotes, clean_value strips them at use sites
        assert_eq!(params.len(), 1);
        assert_eq!(params["$basetexture"], "\"brick/brickwall031d\"");
        assert_eq!(crate::clean_value(&params["$basetexture"]), "brick/brickwall031d");
    }

    #[test]
    fn unquoted_pair() {
        let params = parse("$surfaceprop metal");

        assert_eq!(params["$surfaceprop"], "metal");
    }

    #[test]
    fn first_write_wins() {
        let mut params = ParamMap::new();

        parse_parameter_line("$alpha \"0.5\"", &mut params);
        parse_parameter_line("$alpha \"0.9\"", &mut params);

        assert_eq!(params["$alpha"], "\"0.5\"");
    }

    #[test]
    fn reparse_is_idempotent() {
        let mut params = ParamMap::new();

        parse_parameter_line("\"$basetexture\" \"foo\"", &mut params);
        let once = params.clone();
        parse_parameter_line("\"$basetexture\" \"foo\"", &mut params);

        assert_eq!(once, params);
    }

    #[test]
    fn recovery_four_quotes() {
        // missing separator between key and value
        let params = parse("\"$basetexture\"\"foo/bar\"");

        assert_eq!(params["$basetexture"], "\"foo/bar\"");
    }

    #[test]
    fn recovery_two_quotes() {
        // one quoted token holding a whole pair
        let params = parse("\"$basetexture foo/bar\"");

        assert_eq!(params["$basetexture"], "foo/bar");
    }

    #[test]
    fn unrecoverable_line_is_dropped() {
        let params = parse("$basetexture \"foo");

        assert!(params.is_empty());
    }

    #[test]
    fn multiple_pairs_on_one_line() {
        let params = parse("$nofog 1 $ignorez 1");

        assert_eq!(params.len(), 2);
        assert_eq!(params["$nofog"], "1");
        assert_eq!(params["$ignorez"], "1");
    }

    #[test]
    fn comment_key_is_rejected() {
        let params = parse("// $basetexture foo");

        assert!(params.is_empty());
    }

    #[test]
    fn non_parameter_key_is_rejected() {
        let params = parse("LightmappedGeneric {");

        assert!(params.is_empty());
    }

    #[test]
    fn include_key_is_accepted() {
        let params = parse("include \"materials/base.vmt\"");

        assert_eq!(params["include"], "\"materials/base.vmt\"");
    }

    #[test]
    fn trailing_comment_is_stripped() {
        let params = parse("$alpha 0.5// why is this here");

        assert_eq!(params["$alpha"], "0.5");
    }

    #[test]
    fn gpu_conditional_takes_high_branch() {
        let params = parse("\"GPU>=2?$detailtexture\" \"detail/noise\"");

        assert_eq!(params["$detailtexture"], "\"detail/noise\"");
    }

    #[test]
    fn gpu_conditional_drops_low_branch() {
        let params = parse("\"GPU<2?$detailtexture\" \"detail/noise\"");

        assert!(params.is_empty());
    }

    #[test]
    fn tokenize_keeps_quoted_spaces() {
        let tokens = tokenize("$surfaceprop \"solid metal\"");

        assert_eq!(tokens, vec!["$surfaceprop", "\"solid metal\""]);
    }
}
