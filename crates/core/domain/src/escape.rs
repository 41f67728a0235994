use std::borrow::Cow;

/// Line protocol 中需要反斜杠转义的分隔字符（另加所有空白字符）。
const SEPARATORS: [char; 3] = [',', '=', '"'];

fn is_special(ch: char) -> bool {
    ch.is_whitespace() || SEPARATORS.contains(&ch)
}

/// 换行会把一个数据点拆成多行，转义无法表达，只能在校验时拒绝。
pub fn has_line_break(value: &str) -> bool {
    value.contains(['\n', '\r'])
}

/// 在空白字符、逗号、等号、双引号前加反斜杠。
///
/// 不含特殊字符时直接借用原字符串。
pub fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(is_special) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 4);
    for ch in value.chars() {
        if is_special(ch) {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    Cow::Owned(escaped)
}

/// `escape` 的逆操作：去掉特殊字符前的反斜杠，其他反斜杠原样保留。
pub fn unescape(value: &str) -> Cow<'_, str> {
    if !value.contains('\\') {
        return Cow::Borrowed(value);
    }
    let mut unescaped = String::with_capacity(value.len());
    let mut chars = value.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            if let Some(&next) = chars.peek() {
                if is_special(next) {
                    unescaped.push(next);
                    chars.next();
                    continue;
                }
            }
        }
        unescaped.push(ch);
    }
    Cow::Owned(unescaped)
}
