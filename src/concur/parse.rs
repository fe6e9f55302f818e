//! Line classification: section header, option, or opaque line.
//!
//! Classifiers are tried in order against the same raw text; only a valid
//! match is accepted. Anything unclassifiable becomes an opaque [`Line`]
//! entry — arbitrary prose must be preserved, never rejected.

use super::cursor::Cursor;
use super::dialect::Dialect;
use super::entry::{Entry, Line, OptionEntry, Section, ServiceFields};

/// Classify every line behind the cursor into entries.
pub(crate) fn classify_all(dialect: &Dialect, cursor: &mut Cursor) -> Vec<Entry> {
    let mut entries = Vec::new();
    loop {
        let Some(line) = cursor.advance().map(str::to_owned) else {
            break;
        };
        if dialect.sections
            && let Some(section) = parse_section(dialect, &line, cursor)
        {
            entries.push(Entry::Section(section));
            continue;
        }
        if let Some(mut opt) = parse_option(dialect, &line) {
            if dialect.continuation {
                absorb_continuation(&mut opt, cursor);
            }
            entries.push(Entry::Option(opt));
            continue;
        }
        entries.push(Entry::Line(Line::new(line)));
    }
    entries
}

/// Try to parse one line as an option in this dialect.
///
/// In the service dialect options are `-o key=val` override lines; in every
/// other dialect they are `name <divider> val`, optionally behind a comment
/// marker (a commented-out option is recoverable; a pure prose comment is
/// not, and falls through to [`Line`]).
pub(crate) fn parse_option(dialect: &Dialect, line: &str) -> Option<OptionEntry> {
    if dialect.sections {
        return parse_override(dialect, line);
    }

    let first = line.chars().next()?;
    // An indented line is never an option opener; continuation handling and
    // opaque fallback own those.
    if first.is_whitespace() {
        return None;
    }

    let commented = dialect.is_commenter(first);
    let body = if commented {
        line[first.len_utf8()..].trim_start()
    } else {
        line
    };

    let (name, rest) = dialect.divider.split(body)?;
    if commented && name.contains(char::is_whitespace) {
        // "# see key = val below" style prose; not a recoverable option.
        return None;
    }
    if name.chars().any(|c| dialect.is_commenter(c)) {
        return None;
    }
    let (val, comment) = split_inline_comment(rest, dialect);
    Some(OptionEntry::parsed(name, val, comment, line))
}

/// Parse a `master.cf` override line: `[#]  -o name=val`.
fn parse_override(dialect: &Dialect, line: &str) -> Option<OptionEntry> {
    let mut body = line;
    if let Some(first) = body.chars().next()
        && dialect.is_commenter(first)
    {
        body = &body[first.len_utf8()..];
    }
    let body = body.trim_start().strip_prefix("-o")?;
    // at least one space between -o and the pair
    if !body.starts_with(char::is_whitespace) {
        return None;
    }
    let (name, val) = body.trim_start().split_once('=')?;
    let name = name.trim();
    if name.is_empty() || name.contains(char::is_whitespace) {
        return None;
    }
    Some(OptionEntry::parsed(name, val.trim(), None, line))
}

/// Try to parse a service section starting at `header`; on success the
/// section absorbs every following line up to (not including) the next
/// section header, rewinding the cursor so the outer loop sees that header.
pub(crate) fn parse_section(
    dialect: &Dialect,
    header: &str,
    cursor: &mut Cursor,
) -> Option<Section> {
    let (name, fields) = parse_section_header(dialect, header)?;
    let mut section = Section::parsed(name, fields, header);

    loop {
        let mark = cursor.index();
        let Some(line) = cursor.advance().map(str::to_owned) else {
            break;
        };
        if parse_section_header(dialect, &line).is_some() {
            cursor.rewind(mark);
            break;
        }
        if let Some(opt) = parse_override(dialect, &line) {
            section.push_option(opt);
        } else {
            section.push_line(line);
        }
    }
    Some(section)
}

/// Match the 8-field `master.cf` header pattern:
/// `name type private unpriv chroot wakeup maxproc command...`.
///
/// A comment marker fused to the name is tolerated (the section exists but
/// starts commented); a detached marker (`# smtp inet ...`) is not a header.
fn parse_section_header(dialect: &Dialect, line: &str) -> Option<(String, ServiceFields)> {
    // Every real service line carries at least one bare "-" field; this
    // guard keeps banner comments from matching the 8-field pattern.
    if !line.split_whitespace().any(|tok| tok == "-") {
        return None;
    }

    let mut rest = line;
    let mut fields = [""; 7];
    for slot in &mut fields {
        let trimmed = rest.trim_start();
        let end = trimmed.find(char::is_whitespace)?;
        *slot = &trimmed[..end];
        rest = &trimmed[end..];
    }
    let command = rest.trim();
    if command.is_empty() {
        return None;
    }

    let name = fields[0].trim_start_matches(|c| dialect.is_commenter(c));
    if name.is_empty() {
        return None;
    }

    Some((
        name.to_owned(),
        ServiceFields {
            service_type: fields[1].to_owned(),
            private: fields[2].to_owned(),
            unpriv: fields[3].to_owned(),
            chroot: fields[4].to_owned(),
            wakeup: fields[5].to_owned(),
            maxproc: fields[6].to_owned(),
            command: command.to_owned(),
        },
    ))
}

/// Merge indented follow-up lines into a just-parsed option, giving the
/// first non-matching line back to the cursor.
fn absorb_continuation(opt: &mut OptionEntry, cursor: &mut Cursor) {
    loop {
        let mark = cursor.index();
        let Some(line) = cursor.advance().map(str::to_owned) else {
            break;
        };
        let continues =
            line.starts_with(|c: char| c.is_whitespace()) && !line.trim_start().is_empty();
        if continues {
            opt.absorb_continuation(&line);
        } else {
            cursor.rewind(mark);
            break;
        }
    }
}

/// Split an option value into `(value, inline comment)`: a comment marker
/// preceded by whitespace starts the comment.
fn split_inline_comment(rest: &str, dialect: &Dialect) -> (String, Option<String>) {
    let mut prev_ws = false;
    for (i, c) in rest.char_indices() {
        if prev_ws && dialect.is_commenter(c) {
            let val = rest[..i].trim_end().to_owned();
            let comment = rest[i + c.len_utf8()..].trim();
            let comment = (!comment.is_empty()).then(|| comment.to_owned());
            return (val, comment);
        }
        prev_ws = c.is_whitespace();
    }
    (rest.trim_end().to_owned(), None)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_option() {
        let opt = parse_option(&Dialect::EQUALS, "foo = bar").expect("should parse");
        assert_eq!(opt.name, "foo");
        assert_eq!(opt.val(), "bar");
        assert!(!opt.is_modified());
    }

    #[test]
    fn commented_out_option_is_recovered() {
        let opt = parse_option(&Dialect::EQUALS, "#foo = bar").expect("should parse");
        assert_eq!(opt.name, "foo");
        assert_eq!(opt.val(), "bar");
    }

    #[test]
    fn prose_comment_is_not_an_option() {
        assert!(parse_option(&Dialect::EQUALS, "# just some words").is_none());
        assert!(parse_option(&Dialect::EQUALS, "#").is_none());
    }

    #[test]
    fn inline_comment_is_split_off() {
        let opt = parse_option(&Dialect::EQUALS, "foo = bar # why not").expect("should parse");
        assert_eq!(opt.val(), "bar");
        assert_eq!(opt.comment(), Some("why not"));
    }

    #[test]
    fn hash_fused_to_value_is_part_of_the_value() {
        let opt = parse_option(&Dialect::EQUALS, "color = fg#FF0000").expect("should parse");
        assert_eq!(opt.val(), "fg#FF0000");
        assert_eq!(opt.comment(), None);
    }

    #[test]
    fn indented_line_is_not_an_option() {
        assert!(parse_option(&Dialect::EQUALS, "  foo = bar").is_none());
    }

    #[test]
    fn padded_dialect_option() {
        let opt = parse_option(&Dialect::PADDED, "Syslog                  yes")
            .expect("should parse");
        assert_eq!(opt.name, "Syslog");
        assert_eq!(opt.val(), "yes");
    }

    #[test]
    fn padded_dialect_single_word_comment_falls_through() {
        assert!(parse_option(&Dialect::PADDED, "# note").is_none());
    }

    #[test]
    fn override_line() {
        let opt = parse_override(&Dialect::SERVICE, "  -o smtpd_tls_security_level=may")
            .expect("should parse");
        assert_eq!(opt.name, "smtpd_tls_security_level");
        assert_eq!(opt.val(), "may");
    }

    #[test]
    fn commented_override_line() {
        let opt =
            parse_override(&Dialect::SERVICE, "#  -o soft_bounce=yes").expect("should parse");
        assert_eq!(opt.name, "soft_bounce");
        assert_eq!(opt.val(), "yes");
    }

    #[test]
    fn non_override_indented_line_is_not_an_option() {
        assert!(parse_override(&Dialect::SERVICE, "  flags=DRhu user=vmail").is_none());
    }

    #[test]
    fn section_header_basic() {
        let (name, fields) = parse_section_header(
            &Dialect::SERVICE,
            "smtp      inet  n       -       -       -       -       smtpd",
        )
        .expect("should parse");
        assert_eq!(name, "smtp");
        assert_eq!(fields.service_type, "inet");
        assert_eq!(fields.private, "n");
        assert_eq!(fields.command, "smtpd");
    }

    #[test]
    fn section_header_with_command_args() {
        let (_, fields) = parse_section_header(
            &Dialect::SERVICE,
            "maildrop  unix  -       n       n       -       -       pipe flags=DRhu user=vmail",
        )
        .expect("should parse");
        assert_eq!(fields.command, "pipe flags=DRhu user=vmail");
    }

    #[test]
    fn commented_section_header_is_recognized() {
        let (name, _) = parse_section_header(
            &Dialect::SERVICE,
            "#submission inet n       -       -       -       -       smtpd",
        )
        .expect("should parse");
        assert_eq!(name, "submission");
    }

    #[test]
    fn banner_comment_is_not_a_section_header() {
        assert!(
            parse_section_header(
                &Dialect::SERVICE,
                "# service type  private unpriv  chroot  wakeup  maxproc command + args",
            )
            .is_none(),
            "detached comment markers never open a section"
        );
    }

    #[test]
    fn continuation_merges_and_rewinds() {
        let mut cursor = Cursor::new("  hash:/some/path/two,\n  hash:/some/path/three\nnext = 1\n");
        let mut opt = parse_option(&Dialect::POSTFIX_MAIN, "virtual_alias_maps = hash:/some/path/one,")
            .expect("should parse");
        absorb_continuation(&mut opt, &mut cursor);
        assert_eq!(
            opt.val(),
            "hash:/some/path/one,\n  hash:/some/path/two,\n  hash:/some/path/three"
        );
        assert_eq!(
            cursor.advance(),
            Some("next = 1"),
            "the non-continuation line must be reprocessed"
        );
    }

    #[test]
    fn blank_line_stops_continuation() {
        let mut cursor = Cursor::new("\n  not-a-continuation\n");
        let mut opt = parse_option(&Dialect::POSTFIX_MAIN, "k = v").expect("should parse");
        absorb_continuation(&mut opt, &mut cursor);
        assert_eq!(opt.val(), "v");
        assert_eq!(cursor.index(), 0, "blank line given back");
    }

    #[test]
    fn section_absorbs_children_until_next_header() {
        let body = "\
  -o syslog_name=postfix/submission
  # a nested comment
smtpd     pass  -       -       n       -       -       smtpd
";
        let mut cursor = Cursor::new(body);
        let section = parse_section(
            &Dialect::SERVICE,
            "submission inet n       -       n       -       -       smtpd",
            &mut cursor,
        )
        .expect("should parse");
        assert_eq!(section.name, "submission");
        assert_eq!(section.get_val("syslog_name"), Some("postfix/submission"));
        assert_eq!(section.children().len(), 2);
        assert_eq!(
            cursor.index(),
            2,
            "cursor rewound to the next section header"
        );
    }
}
