//! Template Preprocessing
//!
//! Wordの文書XMLをJinjaテンプレートとして扱えるように整形します。
//!
//! - Wordが1つのタグ（`{{ … }}`, `{% … %}`, `{# … #}`）を複数のランに分割した場合、
//!   タグ内のXMLマークアップを取り除いて1つの連続したタグに戻す
//! - タグ内の引用符（自動修正された`“”‘’`やXML実体参照）を通常の引用符に戻す
//! - `{%p … %}`は囲んでいる段落（`<w:p>`）全体を、`{%tr … %}`は囲んでいる表の行
//!   （`<w:tr>`）全体をタグ自身に置き換える

/// 文書XML全体を前処理する
pub(crate) fn preprocess(xml: &str) -> String {
    let merged = merge_split_tags(xml);
    let rows = collapse_enclosing(&merged, "tr", "w:tr");
    collapse_enclosing(&rows, "p", "w:p")
}

/// 開始区切り文字の2文字目に対応する終了区切り文字の1文字目
fn closing_char(opening: char) -> Option<char> {
    match opening {
        '{' => Some('}'),
        '%' => Some('%'),
        '#' => Some('#'),
        _ => None,
    }
}

/// `pos`から始まるXMLタグ（`<…>`）を読み飛ばした位置を返す
fn skip_markup(xml: &str, mut pos: usize) -> usize {
    while xml[pos..].starts_with('<') {
        match xml[pos..].find('>') {
            Some(end) => pos += end + 1,
            None => return xml.len(),
        }
    }
    pos
}

/// 分割されたタグを連結する
pub(crate) fn merge_split_tags(xml: &str) -> String {
    let mut out = String::with_capacity(xml.len());
    let mut pos = 0;

    while pos < xml.len() {
        let Some(offset) = xml[pos..].find('{') else {
            out.push_str(&xml[pos..]);
            break;
        };
        let brace = pos + offset;
        out.push_str(&xml[pos..brace]);

        let next = skip_markup(xml, brace + 1);
        let close = xml[next..].chars().next().and_then(closing_char);
        let Some(close) = close else {
            out.push('{');
            pos = brace + 1;
            continue;
        };

        match read_tag_body(xml, next + 1, close) {
            Some((body, end)) => {
                out.push('{');
                out.push_str(&xml[next..next + 1]);
                out.push_str(&normalize_expression(&body));
                out.push(close);
                out.push('}');
                pos = end;
            }
            None => {
                // 閉じられていないタグはそのまま残し、Jinja側でエラーにする
                out.push('{');
                pos = brace + 1;
            }
        }
    }
    out
}

/// タグ本体を読み、マークアップを除いた本体と終了区切り文字の直後の位置を返す
fn read_tag_body(xml: &str, start: usize, close: char) -> Option<(String, usize)> {
    let mut body = String::new();
    let mut pos = start;
    while pos < xml.len() {
        let rest = &xml[pos..];
        if rest.starts_with('<') {
            pos = skip_markup(xml, pos);
            continue;
        }
        let c = rest.chars().next()?;
        if c == close {
            let after = skip_markup(xml, pos + c.len_utf8());
            if xml[after..].starts_with('}') {
                return Some((body, after + 1));
            }
        }
        body.push(c);
        pos += c.len_utf8();
    }
    None
}

/// タグ内の式をJinjaが解釈できる形に戻す
fn normalize_expression(body: &str) -> String {
    body.replace(['\u{2018}', '\u{2019}'], "'")
        .replace(['\u{201C}', '\u{201D}'], "\"")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&amp;", "&")
}

/// `{%<marker> … %}`を囲む要素`<element>`全体を`{% … %}`に置き換える
fn collapse_enclosing(xml: &str, marker: &str, element: &str) -> String {
    let opening = format!("{{%{}", marker);
    let start_plain = format!("<{}>", element);
    let start_attr = format!("<{} ", element);
    let end_tag = format!("</{}>", element);

    let mut out = String::with_capacity(xml.len());
    let mut pos = 0;
    loop {
        let found = find_marker(&xml[pos..], &opening).map(|i| pos + i);
        let Some(tag_start) = found else { break };
        let body_start = tag_start + opening.len();
        let Some(body_len) = xml[body_start..].find("%}") else { break };
        let tag_end = body_start + body_len + 2;

        let element_start = [&start_plain, &start_attr]
            .iter()
            .filter_map(|s| xml[pos..tag_start].rfind(s.as_str()))
            .max()
            .map(|i| pos + i);
        let element_end = xml[tag_end..]
            .find(&end_tag)
            .map(|i| tag_end + i + end_tag.len());

        match (element_start, element_end) {
            (Some(s), Some(e)) => {
                out.push_str(&xml[pos..s]);
                out.push_str("{%");
                out.push_str(&xml[body_start..body_start + body_len]);
                out.push_str("%}");
                pos = e;
            }
            _ => {
                // 囲む要素がない場合は通常のタグとして残す
                out.push_str(&xml[pos..tag_start]);
                out.push_str("{%");
                pos = body_start;
            }
        }
    }
    out.push_str(&xml[pos..]);
    out
}

/// 直後が空白の`opening`を探す（`{%p`が`{%print`などに一致しないように）
fn find_marker(haystack: &str, opening: &str) -> Option<usize> {
    let mut from = 0;
    while let Some(i) = haystack[from..].find(opening) {
        let at = from + i;
        let after = &haystack[at + opening.len()..];
        if after.starts_with(char::is_whitespace) {
            return Some(at);
        }
        from = at + opening.len();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_tag_split_across_runs() {
        let xml = r#"<w:r><w:t>{{ na</w:t></w:r><w:r><w:rPr><w:b/></w:rPr><w:t>me }}</w:t></w:r>"#;
        assert_eq!(
            merge_split_tags(xml),
            r#"<w:r><w:t>{{ name }}</w:t></w:r>"#
        );
    }

    #[test]
    fn test_merge_split_delimiters() {
        let xml = r#"<w:t>{</w:t><w:t>{ name }</w:t><w:t>}</w:t>"#;
        assert_eq!(merge_split_tags(xml), r#"<w:t>{{ name }}</w:t>"#);
    }

    #[test]
    fn test_plain_braces_are_kept() {
        let xml = "<w:t>{x} and {</w:t><w:t> y}</w:t>";
        assert_eq!(merge_split_tags(xml), xml);
    }

    #[test]
    fn test_quotes_are_normalized_inside_tags() {
        let xml = "<w:t>{% if name == \u{201C}EN\u{201D} %}&quot;x&quot;{% endif %}</w:t>";
        assert_eq!(
            merge_split_tags(xml),
            "<w:t>{% if name == \"EN\" %}&quot;x&quot;{% endif %}</w:t>"
        );
    }

    #[test]
    fn test_collapse_paragraph_tags() {
        let xml = concat!(
            r#"<w:body><w:p w:rsidR="1"><w:pPr/><w:r><w:t>{%p for t in data %}</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>{{ t }}</w:t></w:r></w:p>"#,
            r#"<w:p><w:r><w:t>{%p endfor %}</w:t></w:r></w:p></w:body>"#,
        );
        assert_eq!(
            preprocess(xml),
            r#"<w:body>{% for t in data %}<w:p><w:r><w:t>{{ t }}</w:t></w:r></w:p>{% endfor %}</w:body>"#
        );
    }

    #[test]
    fn test_collapse_table_row_tags() {
        let xml = concat!(
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>{%tr for a, b, c in rows %}</w:t></w:r></w:p></w:tc></w:tr>"#,
            r#"<w:tr><w:tc><w:p><w:r><w:t>{{ a }}</w:t></w:r></w:p></w:tc></w:tr>"#,
            r#"<w:tr><w:tc><w:p><w:r><w:t>{%tr endfor %}</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        );
        assert_eq!(
            preprocess(xml),
            concat!(
                r#"<w:tbl>{% for a, b, c in rows %}"#,
                r#"<w:tr><w:tc><w:p><w:r><w:t>{{ a }}</w:t></w:r></w:p></w:tc></w:tr>"#,
                r#"{% endfor %}</w:tbl>"#,
            )
        );
    }

    #[test]
    fn test_marker_requires_whitespace() {
        assert_eq!(find_marker("{%print x %}", "{%p"), None);
        assert_eq!(find_marker("a{%p if x %}", "{%p"), Some(1));
    }
}
