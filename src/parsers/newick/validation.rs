use super::super::TreeParseError;

/// Pre-validates a NEWICK string before the scan builds any nodes.
///
/// Checks that the string ends with `;` and that parentheses, square
/// brackets and single quotes are balanced.
pub(crate) fn check_newick_structure(s: &str) -> Result<(), TreeParseError> {
    let content = s.trim_end();
    if !content.ends_with(';') {
        return Err(TreeParseError::newick(
            content.len(),
            "missing terminating ';'",
        ));
    }

    check_balanced_delimiters(content)
}

/// Checks that the string has balanced parentheses, brackets, and quotes.
fn check_balanced_delimiters(s: &str) -> Result<(), TreeParseError> {
    let mut paren_depth: usize = 0;
    let mut bracket_depth: usize = 0;
    let mut in_quotes = false;
    let mut quote_start: usize = 0;

    for (position, c) in s.char_indices() {
        match c {
            '\'' if bracket_depth == 0 => {
                in_quotes = !in_quotes;
                quote_start = position;
            }
            _ if in_quotes => {}
            '[' => bracket_depth += 1,
            ']' => {
                if bracket_depth == 0 {
                    return Err(TreeParseError::newick(position, "unbalanced ']'"));
                }
                bracket_depth -= 1;
            }
            _ if bracket_depth > 0 => {}
            '(' => paren_depth += 1,
            ')' => {
                if paren_depth == 0 {
                    return Err(TreeParseError::newick(position, "unbalanced ')'"));
                }
                paren_depth -= 1;
            }
            _ => {}
        }
    }

    if in_quotes {
        Err(TreeParseError::newick(quote_start, "unterminated quote"))
    } else if bracket_depth != 0 {
        Err(TreeParseError::newick(s.len(), "unbalanced '['"))
    } else if paren_depth != 0 {
        Err(TreeParseError::newick(s.len(), "unbalanced '('"))
    } else {
        Ok(())
    }
}
