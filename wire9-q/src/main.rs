mod parser;

use wire9::*;
use std::io::{self, Write};
use anyhow::{Context, Result, anyhow};
use structopt::StructOpt;
use std::str::from_utf8;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

/// Decode and print wire9 messages, or encode them from their textual representation
#[derive(StructOpt)]
#[structopt(name = "w9q", author = "Liv Fischer")]
struct Opt {
    /// layout of the message on stdin, for instance '(u16 u32 [str])'
    #[structopt(short, long)]
    schema: Option<String>,
    /// parse a textual representation and encode it into a binary message instead
    #[structopt(short, long)]
    encode: bool,
    /// print the size of the encoded message instead of the message
    #[structopt(long, requires = "encode")]
    size: bool,
    /// binary messages are read or written as base64
    #[structopt(short, long)]
    base64: bool,
    /// log more, repeat for even more
    #[structopt(short, long, parse(from_occurrences))]
    verbose: u8,
}

fn main() -> Result<()> {
    let opt = Opt::from_args();
    init_logging(opt.verbose);
    let mut input = Buffer::default();
    io::copy(&mut io::stdin().lock(), &mut input).context("Failed to read stdin")?;
    debug!(bytes = input.len(), "read stdin");
    if opt.encode {
        encode(input.bytes(), &opt)
    } else {
        let schema = opt.schema.as_deref().ok_or_else(|| anyhow!("--schema is required to decode a message"))?;
        let input = if opt.base64 { Buffer::new(unbase64(input.bytes())?) } else { input };
        print(input, schema)
    }
}

/// `RUST_LOG` wins over `-v`
fn init_logging(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn unbase64(text: &[u8]) -> Result<Vec<u8>> {
    let text: Vec<u8> = text.iter().copied().filter(|b| !b.is_ascii_whitespace()).collect();
    base64::decode(&text).context("input is not base64")
}

fn print(mut buf: Buffer, schema: &str) -> Result<()> {
    let shape = parser::parse_shape(schema).context("Invalid schema")?;
    debug!(%shape, bytes = buf.len(), "decoding");
    let value = Value::decode(&shape, &mut buf).context("Decoding error")?;
    if !buf.is_empty() {
        warn!(trailing = buf.len(), "input continues after the message");
    }
    println!("{}", &value);
    Ok(())
}

fn encode(input: &[u8], opt: &Opt) -> Result<()> {
    let string = from_utf8(input).context("input is not utf-8")?;
    let value = parser::parse_value(string)?;
    let mut buf = Buffer::with_capacity(value.size());
    value.encode(&mut buf).context("Encoding error")?;
    info!(bytes = buf.len(), "encoded");
    let stdout = io::stdout();
    emit(stdout.lock(), &buf, opt.size, opt.base64).context("Failed to write stdout")
}

fn emit<W: Write>(mut out: W, buf: &Buffer, size_only: bool, as_base64: bool) -> io::Result<()> {
    if size_only {
        writeln!(out, "{}", buf.len())?;
    } else if as_base64 {
        writeln!(out, "{}", base64::encode(buf.bytes()))?;
    } else {
        out.write_all(buf.bytes())?;
    }
    out.flush()
}

#[cfg(test)]
mod tests {
    use super::emit;
    use std::io::LineWriter;
    use wire9::Buffer;

    #[test]
    fn raw_output_survives_line_buffering() {
        let mut message = vec![b'\n'];
        message.extend_from_slice(&[b'x'; 2000]);
        let mut out = LineWriter::new(Vec::new());
        emit(&mut out, &Buffer::new(message.clone()), false, false).unwrap();
        assert_eq!(out.get_ref(), &message);
    }

    #[test]
    fn size_and_base64() {
        let buf = Buffer::new(vec![7, 0, 2, 0]);
        let mut out = Vec::new();
        emit(&mut out, &buf, true, false).unwrap();
        assert_eq!(out, b"4\n");
        let mut out = Vec::new();
        emit(&mut out, &buf, false, true).unwrap();
        assert_eq!(out, b"BwACAA==\n");
    }

}
