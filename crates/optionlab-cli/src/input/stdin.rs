use std::io::{self, Read};

/// Raw request text piped on stdin; `None` when stdin is a terminal or the
/// pipe carried only whitespace.
pub fn read_stdin() -> io::Result<Option<String>> {
    if atty::is(atty::Stream::Stdin) {
        return Ok(None);
    }

    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(non_blank(buffer))
}

fn non_blank(buffer: String) -> Option<String> {
    if buffer.trim().is_empty() {
        None
    } else {
        Some(buffer)
    }
}
