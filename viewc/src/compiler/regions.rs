//! Finding and replacing delimited regions in template text.
use std::ops::Range;

use crate::compiler::scan::find_region_end;
use crate::error::{line_of, Error, ErrorKind};
use crate::settings::Settings;
use crate::syntax::{StartMarker, Syntax};

/// The byte ranges of `<pre>` elements.  Interpolations inside them are
/// left alone.
pub(crate) fn pre_ranges(source: &str) -> Vec<Range<usize>> {
    let lower = source.to_ascii_lowercase();
    let mut rv = Vec::new();
    let mut pos = 0;
    while let Some(idx) = lower[pos..].find("<pre").map(|x| x + pos) {
        let after = lower.as_bytes().get(idx + 4).copied();
        if !matches!(after, Some(b'>') | Some(b'/'))
            && !after.map_or(false, |c| c.is_ascii_whitespace())
        {
            pos = idx + 4;
            continue;
        }
        let end = lower[idx..]
            .find("</pre>")
            .map_or(source.len(), |x| idx + x + 6);
        rv.push(idx..end);
        pos = end;
    }
    rv
}

/// Finds the next region start at or after `pos`.
fn next_start(
    source: &str,
    pos: usize,
    syntax: &Syntax,
    kinds: &[StartMarker],
    pre: &[Range<usize>],
) -> Option<(usize, StartMarker)> {
    let mut best: Option<(usize, StartMarker)> = None;
    for &kind in kinds {
        let marker = syntax.delimiters(kind).0;
        let mut from = pos;
        while let Some(idx) = source[from..].find(marker).map(|x| x + from) {
            if best.map_or(false, |(best_idx, _)| best_idx < idx) {
                break;
            }
            if kind == StartMarker::Variable {
                if let Some(range) = pre.iter().find(|x| x.contains(&idx)) {
                    from = range.end;
                    continue;
                }
            }
            if syntax.is_shadowed(kind, &source[idx..]) {
                from = idx + marker.len();
                continue;
            }
            best = Some((idx, kind));
            break;
        }
    }
    best
}

/// Walks all regions of the given kinds in `source` and replaces them with
/// what `compile_region` returns for their body.
///
/// `Ok(None)` from the callback copies the region through as it is.  A
/// failing region either aborts the walk (strict) or is copied through from
/// its start delimiter on, in which case the walk continues right after the
/// start delimiter.
pub(crate) fn rewrite_regions<F>(
    source: &str,
    settings: &Settings,
    name: Option<&str>,
    kinds: &[StartMarker],
    mut compile_region: F,
) -> Result<String, Error>
where
    F: FnMut(StartMarker, &str) -> Result<Option<String>, Error>,
{
    let syntax = settings.syntax();
    // an empty start delimiter would match forever without advancing
    ok!(syntax.check_delimiters());
    let pre = if kinds.contains(&StartMarker::Variable) {
        pre_ranges(source)
    } else {
        Vec::new()
    };
    let mut out = String::with_capacity(source.len());
    let mut pos = 0;

    while let Some((start, kind)) = next_start(source, pos, syntax, kinds, &pre) {
        let (open, close) = syntax.delimiters(kind);
        let body_start = start + open.len();
        let rv = find_end(source, body_start, kind, close).and_then(|end| {
            compile_region(kind, &source[body_start..end])
                .map(|code| (end + close.len(), code))
                .map_err(|err| err.at_offset(start))
        });

        match rv {
            Ok((end, code)) => {
                out.push_str(&source[pos..start]);
                out.push_str(code.as_deref().unwrap_or(&source[start..end]));
                pos = end;
            }
            Err(err) if settings.is_strict() => return Err(err),
            Err(err) => {
                log::warn!(
                    "{}:{}: {}, region left unrewritten",
                    name.unwrap_or("<string>"),
                    line_of(source, err.offset().unwrap_or(start)),
                    err
                );
                out.push_str(&source[pos..body_start]);
                pos = body_start;
            }
        }
    }

    out.push_str(&source[pos..]);
    Ok(out)
}

fn find_end(
    source: &str,
    body_start: usize,
    kind: StartMarker,
    close: &str,
) -> Result<usize, Error> {
    if kind != StartMarker::Comment {
        return find_region_end(source, body_start, close);
    }
    // comments are free text, nothing in them nests
    source[body_start..]
        .find(close)
        .map(|x| x + body_start)
        .ok_or_else(|| {
            Error::new(ErrorKind::UnterminatedRegion, format!("missing `{close}`"))
                .with_offset(body_start)
        })
}
