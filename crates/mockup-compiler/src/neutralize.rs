//! Strip framework declaration syntax from component logic.
//!
//! The result is plain script text that can be evaluated in an unprivileged
//! frame. This is a lossy textual normalization, not a type-checked
//! transform. The forms removed are:
//!
//! - `import ... from '...'` and side-effect `import '...'` statements
//! - class annotation blocks: `@Component(...)`, `@Directive(...)`,
//!   `@Injectable(...)`, `@Pipe(...)`, `@NgModule(...)`
//! - `interface` declarations and `type X = ...;` aliases
//! - `export` / `export default` keywords
//! - `implements A, B` clauses
//! - member annotations: `@Input(...)`, `@Output(...)`, `@ViewChild(...)`,
//!   `@ViewChildren(...)`, `@ContentChild(...)`, `@ContentChildren(...)`,
//!   `@HostBinding(...)`, `@HostListener(...)`
//! - `new EventEmitter<T>()`, replaced by an object with a no-op `emit`
//! - access modifiers (`public`, `private`, `protected`, `readonly`,
//!   `override`, `declare`, `abstract`)
//! - type annotations on fields, locals, parameters and return types,
//!   including optional (`?:`), definite (`!:`), array (`T[]`), union,
//!   generic and `void` forms; `as` casts; generic call arguments;
//!   non-null assertions
//!
//! Anything else (enums, decorators with nested parentheses in arguments,
//! inline object types on parameters) may survive partially.

use regex::{Captures, Regex};

/// Class-level annotations removed together with their argument block.
const CLASS_DECORATORS: &[&str] = &["Component", "Directive", "Injectable", "Pipe", "NgModule"];

/// Member-level annotations removed together with their argument list.
const MEMBER_DECORATORS: &[&str] = &[
    "Input",
    "Output",
    "ViewChild",
    "ViewChildren",
    "ContentChild",
    "ContentChildren",
    "HostBinding",
    "HostListener",
];

/// A single type expression: names, string literal types, small inline
/// object types, generics, arrays and unions.
const TYPE: &str = r#"(?:[A-Za-z_$][\w$.]*|'[^'\n]*'|"[^"\n]*"|\{[^{}\n]*\})(?:<[^=;\n]*?>)?(?:\[\])*(?:\s*\|\s*(?:[A-Za-z_$][\w$.]*|'[^'\n]*'|"[^"\n]*"|\{[^{}\n]*\})(?:<[^=;\n]*?>)?(?:\[\])*)*"#;

/// Neutralization steps, in application order.
pub const STEPS: [(&str, fn(&str) -> String); 10] = [
    ("imports", strip_imports),
    ("class-decorators", strip_class_decorators),
    ("type-declarations", strip_type_declarations),
    ("exports", strip_exports),
    ("implements", strip_implements),
    ("member-decorators", strip_member_decorators),
    ("event-emitters", replace_event_emitters),
    ("access-modifiers", strip_access_modifiers),
    ("signatures", strip_signature_types),
    ("annotations", strip_type_annotations),
];

/// Turn component logic into plain executable script text.
pub fn neutralize(logic: &str) -> String {
    STEPS
        .iter()
        .fold(logic.to_string(), |acc, (_, step)| step(&acc))
        .trim()
        .to_string()
}

pub fn strip_imports(src: &str) -> String {
    let import_re = Regex::new(
        r#"(?m)^[ \t]*import\s+(?:type\s+)?(?:[\w*${}\s,]+?\s+from\s+)?['"][^'"\n]+['"][ \t]*;?[ \t]*\r?\n?"#,
    )
    .unwrap();
    import_re.replace_all(src, "").to_string()
}

pub fn strip_class_decorators(src: &str) -> String {
    remove_decorator_calls(src, CLASS_DECORATORS)
}

pub fn strip_member_decorators(src: &str) -> String {
    remove_decorator_calls(src, MEMBER_DECORATORS)
}

/// Remove `interface X { ... }` blocks and `type X = ...;` aliases.
pub fn strip_type_declarations(src: &str) -> String {
    let interface_re =
        Regex::new(r#"(?m)^[ \t]*(?:export\s+)?(?:declare\s+)?interface\s+[A-Za-z_$][\w$]*[^{]*\{"#).unwrap();
    let mut result = src.to_string();
    while let Some(m) = interface_re.find(&result) {
        let open = m.end() - 1;
        let Some(close) = find_closing(&result, open, '{', '}') else {
            break;
        };
        let end = skip_line_end(&result, close + 1);
        result.replace_range(m.start()..end, "");
    }

    let alias_re =
        Regex::new(r#"(?m)^[ \t]*(?:export\s+)?type\s+[A-Za-z_$][\w$]*(?:<[^>]*>)?\s*=[^;]*;[ \t]*\r?\n?"#).unwrap();
    alias_re.replace_all(&result, "").to_string()
}

pub fn strip_exports(src: &str) -> String {
    let export_re = Regex::new(r#"(?m)^([ \t]*)export\s+(?:default\s+)?"#).unwrap();
    export_re.replace_all(src, "${1}").to_string()
}

pub fn strip_implements(src: &str) -> String {
    let implements_re = Regex::new(r#"\s+implements\s+[^{]+\{"#).unwrap();
    implements_re.replace_all(src, " {").to_string()
}

pub fn replace_event_emitters(src: &str) -> String {
    let emitter_re = Regex::new(r#"new\s+EventEmitter\s*(?:<[^()]*>)?\s*\(\s*\)"#).unwrap();
    emitter_re
        .replace_all(src, "{ emit: function () {} }")
        .to_string()
}

/// Drop access modifiers in front of member and parameter names (outside string literals).
pub fn strip_access_modifiers(src: &str) -> String {
    let modifier_re = Regex::new(
        r#"(^|[\s(,])(?:(?:public|private|protected|readonly|override|declare|abstract)\s+)+([A-Za-z_$][\w$]*\s*[?!]?\s*[:=;(,)])"#,
    )
    .unwrap();
    map_code_segments(src, |code| modifier_re.replace_all(code, "${1}${2}").to_string())
}

/// Remove parameter types and return types from function, method and arrow signatures.
pub fn strip_signature_types(src: &str) -> String {
    let signature_re = Regex::new(r#"\(([^()]*)\)\s*(?::[^{;()=]*?)?\s*(\{|=>)"#).unwrap();
    signature_re
        .replace_all(src, |caps: &Captures| {
            let params: Vec<String> = split_top_level(&caps[1])
                .into_iter()
                .map(strip_parameter_type)
                .collect();
            format!("({}) {}", params.join(","), &caps[2])
        })
        .to_string()
}

/// Remove type annotations from fields and `let`/`const`/`var`, plus casts,
/// generic call arguments and non-null assertions.
pub fn strip_type_annotations(src: &str) -> String {
    let field_re = Regex::new(&format!(
        r#"(?m)^([ \t]*(?:static\s+)?[A-Za-z_$][\w$]*)[?!]?\s*:\s*{TYPE}\s*(=|;)"#
    ))
    .unwrap();
    let result = field_re.replace_all(src, |caps: &Captures| {
        let head = &caps[1];
        if matches!(head.trim(), "default" | "case") {
            return caps[0].to_string();
        }
        if &caps[2] == "=" {
            format!("{head} =")
        } else {
            format!("{head};")
        }
    });

    let local_re = Regex::new(&format!(
        r#"\b(let|const|var)\s+([A-Za-z_$][\w$]*)\s*:\s*{TYPE}\s*(=|;)"#
    ))
    .unwrap();
    let result = local_re.replace_all(&result, "${1} ${2} ${3}");

    let generic_call_re = Regex::new(r#"([\w$])<[\w$\s,.\[\]|<>]*>\("#).unwrap();
    let result = generic_call_re.replace_all(&result, "${1}(");

    let non_null_re = Regex::new(r#"([\w$)\]])!\."#).unwrap();
    let result = non_null_re.replace_all(&result, "${1}.");

    let cast_re = Regex::new(
        r#"([\w$)\]])\s+as\s+(?:const|any|unknown|string|number|boolean|[A-Z][\w$.]*(?:<[^>\n]*>)?(?:\[\])*)\b"#,
    )
    .unwrap();
    map_code_segments(&result, |code| cast_re.replace_all(code, "${1}").to_string())
}

/// `private http: HttpClient` → `http`, `size?: number = 3` → `size = 3`.
fn strip_parameter_type(param: &str) -> String {
    let param_re = Regex::new(
        r#"^(\s*(?:\.\.\.)?[A-Za-z_$][\w$]*)\s*\??\s*:\s*(?:[^=]+?)(\s*=\s*[\s\S]*)?\s*$"#,
    )
    .unwrap();
    match param_re.captures(param) {
        Some(caps) => format!(
            "{}{}",
            &caps[1],
            caps.get(2).map(|m| m.as_str()).unwrap_or_default()
        ),
        None => param.to_string(),
    }
}

/// Remove every `@Name(...)` call for the given decorator names, with balanced parentheses.
fn remove_decorator_calls(src: &str, names: &[&str]) -> String {
    let alternatives = names.join("|");
    let decorator_re = Regex::new(&format!(r#"@(?:{alternatives})\s*\("#)).unwrap();
    let mut result = src.to_string();
    let mut search_from = 0;
    while let Some(m) = decorator_re.find_at(&result, search_from) {
        let (start, m_end) = (m.start(), m.end());
        let open = m_end - 1;
        let Some(close) = find_closing(&result, open, '(', ')') else {
            search_from = m_end;
            continue;
        };
        let mut end = close + 1;
        while result[end..].starts_with([' ', '\t']) {
            end += 1;
        }
        if result[end..].starts_with('\n') || result[end..].starts_with("\r\n") {
            end = skip_line_end(&result, end);
        }
        result.replace_range(start..end, "");
        search_from = start;
    }
    result
}

/// Index of the delimiter closing the one at `open`, skipping string literals.
fn find_closing(src: &str, open: usize, open_ch: char, close_ch: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for (i, ch) in src[open..].char_indices() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == q {
                quote = None;
            }
            continue;
        }
        match ch {
            '\'' | '"' | '`' => quote = Some(ch),
            c if c == open_ch => depth += 1,
            c if c == close_ch => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + i);
                }
            }
            _ => {}
        }
    }
    None
}

fn skip_line_end(src: &str, pos: usize) -> usize {
    let rest = &src[pos..];
    if rest.starts_with("\r\n") {
        pos + 2
    } else if rest.starts_with('\n') {
        pos + 1
    } else {
        pos
    }
}

/// Split a parameter list on commas that are not nested in `<>`, `()`, `[]` or `{}`.
fn split_top_level(s: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0i32;
    let mut start = 0;
    for (i, ch) in s.char_indices() {
        match ch {
            '<' | '(' | '[' | '{' => depth += 1,
            '>' | ')' | ']' | '}' => depth -= 1,
            ',' if depth == 0 => {
                parts.push(&s[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&s[start..]);
    parts
}

/// Apply `f` to the code between string literals, leaving literals untouched.
fn map_code_segments(src: &str, f: impl Fn(&str) -> String) -> String {
    let mut result = String::with_capacity(src.len());
    let mut code_start = 0;
    let mut chars = src.char_indices().peekable();
    while let Some((i, ch)) = chars.next() {
        if !matches!(ch, '\'' | '"' | '`') {
            continue;
        }
        result.push_str(&f(&src[code_start..i]));
        let mut end = src.len();
        let mut escaped = false;
        for (j, c) in chars.by_ref() {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == ch {
                end = j + c.len_utf8();
                break;
            }
        }
        result.push_str(&src[i..end]);
        code_start = end;
    }
    result.push_str(&f(&src[code_start..]));
    result
}
