use anyhow::{Result, anyhow, bail};

pub const BOUNDARY: &str = "frame";
pub const PART_CONTENT_TYPE: &str = "image/jpeg";
/// Value for the HTTP `Content-Type` header of the whole stream.
pub const CONTENT_TYPE: &str = "multipart/x-mixed-replace; boundary=frame";

const CRLF: &[u8] = b"\r\n";

/// Wraps one JPEG image as a multipart/x-mixed-replace part.
pub fn encode_part(jpeg: &[u8]) -> Vec<u8> {
    let header = format!("--{BOUNDARY}\r\nContent-Type: {PART_CONTENT_TYPE}\r\n\r\n");
    let mut part = Vec::with_capacity(header.len() + jpeg.len() + CRLF.len());
    part.extend_from_slice(header.as_bytes());
    part.extend_from_slice(jpeg);
    part.extend_from_slice(CRLF);
    part
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MjpegPart<'a> {
    pub boundary: &'a str,
    pub content_type: &'a str,
    pub body: &'a [u8],
}

/// Splits a single chunk produced by [`encode_part`] back into its pieces.
pub fn parse_part(chunk: &[u8]) -> Result<MjpegPart<'_>> {
    let header_end = find(chunk, b"\r\n\r\n")
        .ok_or_else(|| anyhow!("part has no header terminator"))?;
    let header = std::str::from_utf8(&chunk[..header_end])
        .map_err(|err| anyhow!("part header is not utf-8: {err}"))?;

    let mut lines = header.split("\r\n");
    let boundary = lines
        .next()
        .and_then(|line| line.strip_prefix("--"))
        .ok_or_else(|| anyhow!("part does not start with a boundary line"))?;

    let mut content_type = None;
    for line in lines {
        let Some((name, value)) = line.split_once(':') else {
            bail!("malformed part header line {line:?}");
        };
        if name.trim().eq_ignore_ascii_case("content-type") {
            content_type = Some(value.trim());
        }
    }
    let content_type = content_type.ok_or_else(|| anyhow!("part has no content type"))?;

    let body = chunk[header_end + 4..]
        .strip_suffix(CRLF)
        .ok_or_else(|| anyhow!("part body is not terminated by CRLF"))?;

    Ok(MjpegPart {
        boundary,
        content_type,
        body,
    })
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
