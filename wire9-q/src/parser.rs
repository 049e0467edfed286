use nom::{
    character::complete::{char, digit1, none_of},
    Finish,
    IResult,
    combinator::{all_consuming, map, map_res, opt, value},
    multi::{many0, separated_list0},
    sequence::{delimited, preceded, terminated, tuple},
    branch::alt,
    bytes::complete::{tag, take_while, escaped_transform},
};
use wire9::{Shape, Value};
use anyhow::{anyhow, Result};
use base64::decode;

const WHITESPACE: &str = " \t\r\n";
const B64_CHARS: &str = "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789+/=";

fn white(i: &str) -> IResult<&str, &str> {
    take_while(move |c| WHITESPACE.contains(c))(i)
}

fn comma(i: &str) -> IResult<&str, char> {
    delimited(white, char(','), white)(i)
}

fn shape(i: &str) -> IResult<&str, Shape> {
    alt((
        value(Shape::U8, tag("u8")),
        value(Shape::U16, tag("u16")),
        value(Shape::U32, tag("u32")),
        value(Shape::U64, tag("u64")),
        value(Shape::Str, tag("str")),
        value(Shape::Bytes, tag("bytes")),
        map(delimited(terminated(char('['), white), shape, preceded(white, char(']'))), |s| Shape::Seq(Box::new(s))),
        map(delimited(char('('), many0(preceded(white, shape)), preceded(white, char(')'))), Shape::Struct),
    ))(i)
}

fn int(i: &str) -> IResult<&str, Value> {
    map_res(tuple((digit1, alt((tag("u8"), tag("u16"), tag("u32"), tag("u64"))))), |(n, suffix): (&str, &str)| {
        Ok::<_, std::num::ParseIntError>(match suffix {
            "u8"  => Value::U8(n.parse()?),
            "u16" => Value::U16(n.parse()?),
            "u32" => Value::U32(n.parse()?),
            _     => Value::U64(n.parse()?),
        })
    })(i)
}

fn string(i: &str) -> IResult<&str, String> {
    delimited(
            tag("\""),
            map(opt(escaped_transform(
                none_of("\\\""),
                '\\',
                alt((
                        value("\\", tag("\\")),
                        value("\"", tag("\"")),
                        value("\n", tag("n")),
                )))), |c| c.unwrap_or_default()),
            tag("\"")
    )(i)
}

fn bytes(i: &str) -> IResult<&str, Vec<u8>> {
    map_res(delimited(tag("'"), take_while(move |c| B64_CHARS.contains(c)), tag("'")), decode)(i)
}

/// `open` v, v, ... `close`, optionally with a trailing comma
fn list<'a>(open: char, close: char) -> impl FnMut(&'a str) -> IResult<&'a str, Vec<Value>> {
    delimited(
        terminated(char(open), white),
        terminated(separated_list0(comma, wire_value), opt(comma)),
        preceded(white, char(close)),
    )
}

fn wire_value(i: &str) -> IResult<&str, Value> {
    alt((
        int,
        map(string, Value::Str),
        map(bytes, Value::Bytes),
        map(list('[', ']'), Value::Seq),
        map(list('(', ')'), Value::Struct),
    ))(i)
}

pub fn parse_shape(i: &str) -> Result<Shape> {
    Ok(all_consuming(delimited(white, shape, white))(i).finish().map_err(|e| anyhow!("{}", e))?.1)
}

pub fn parse_value(i: &str) -> Result<Value> {
    Ok(all_consuming(delimited(white, wire_value, white))(i).finish().map_err(|e| anyhow!("{}", e))?.1)
}
