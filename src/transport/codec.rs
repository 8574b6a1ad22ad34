use std::io;
use tokio_util::bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

// commands go out as ASCII text plus a trailing space, no line terminator;
// replies come back as CR/LF terminated lines
#[derive(Debug, Default)]
pub struct WireCodec;

impl<'a> Encoder<&'a str> for WireCodec {
    type Error = io::Error;

    fn encode(&mut self, item: &'a str, dst: &mut BytesMut) -> Result<(), io::Error> {
        dst.reserve(item.len() + 1);
        dst.put(item.as_bytes());
        dst.put_u8(b' ');
        Ok(())
    }
}

impl Decoder for WireCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        let newline = match src.iter().position(|b| *b == b'\n') {
            Some(idx) => idx,
            None => return Ok(None),
        };
        let mut line = src.split_to(newline + 1);
        line.truncate(newline);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        match String::from_utf8(line.to_vec()) {
            Ok(text) => Ok(Some(text)),
            Err(_) => Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "non-utf8 line from device",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_appends_trailing_space() {
        let mut codec = WireCodec;
        let mut buf = BytesMut::new();
        codec.encode("PP100", &mut buf).unwrap();
        assert_eq!(&buf[..], b"PP100 ");
    }

    #[test]
    fn test_decode_strips_line_terminator() {
        let mut codec = WireCodec;
        let mut buf = BytesMut::from(&b"PP100 *\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PP100 *".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
    }

    #[test]
    fn test_decode_waits_for_full_line() {
        let mut codec = WireCodec;
        let mut buf = BytesMut::from(&b"PP10"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), None);
        buf.extend_from_slice(b"0 *\r\n");
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("PP100 *".to_string()));
    }

    #[test]
    fn test_decode_splits_stacked_lines() {
        let mut codec = WireCodec;
        let mut buf = BytesMut::from(&b"!T\r\nlimit hit\r\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("!T".to_string()));
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("limit hit".to_string()));
    }

    #[test]
    fn test_decode_accepts_bare_newline() {
        let mut codec = WireCodec;
        let mut buf = BytesMut::from(&b"ready\n"[..]);
        assert_eq!(codec.decode(&mut buf).unwrap(), Some("ready".to_string()));
    }
}
