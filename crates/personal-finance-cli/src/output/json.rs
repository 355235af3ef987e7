use serde_json::Value;
use std::io::{self, Write};

/// Pretty JSON on a terminal, a single compact line when stdout is piped so
/// long amortization schedules stay cheap to feed into other tools.
pub fn print_json(value: &Value) {
    let pretty = atty::is(atty::Stream::Stdout);
    let mut out = io::stdout().lock();
    match write_json(&mut out, value, pretty) {
        Ok(()) => {}
        // Reader went away (`pfc ... | head`)
        Err(e) if e.kind() == io::ErrorKind::BrokenPipe => {}
        Err(e) => log::error!("failed to write JSON output: {e}"),
    }
}

fn write_json<W: Write>(out: &mut W, value: &Value, pretty: bool) -> io::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut *out, value)?;
    } else {
        serde_json::to_writer(&mut *out, value)?;
    }
    writeln!(out)?;
    out.flush()
}
