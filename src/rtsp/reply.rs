use crate::error::{ClientError, Result};
use std::collections::HashMap;

/// A parsed RTSP reply: status line, headers, and an optional body (the
/// SDP payload on a DESCRIBE reply).
#[derive(Debug, Clone)]
pub struct Reply {
    pub ok: bool,
    pub cseq: Option<u32>,
    pub session_id: Option<String>,
    pub session_timeout: Option<String>,
    pub headers: HashMap<String, String>,
    pub body: Option<String>,
    pub is_announce: bool,
}

impl Reply {
    pub fn parse(text: &str) -> Result<Self> {
        if text.starts_with("ANNOUNCE") {
            return Ok(Reply {
                ok: false,
                cseq: None,
                session_id: None,
                session_timeout: None,
                headers: HashMap::new(),
                body: None,
                is_announce: true,
            });
        }

        let (head, body) = match text.split_once("\r\n\r\n") {
            Some((h, b)) => (h, if b.is_empty() { None } else { Some(b.to_string()) }),
            None => (text, None),
        };

        let mut lines = head.lines();
        let status_line = lines.next().unwrap_or_default();
        let ok = status_line.contains("200 OK");

        let mut headers = HashMap::new();
        for line in lines {
            if let Some((k, v)) = line.split_once(':') {
                headers.insert(k.trim().to_string(), v.trim().to_string());
            }
        }

        let cseq = headers
            .get("CSeq")
            .map(|v| {
                v.trim().parse::<u32>().map_err(|_| ClientError::RtspParseError {
                    detail: format!("non-numeric CSeq {v:?}"),
                })
            })
            .transpose()?;

        let (session_id, session_timeout) = match headers.get("Session") {
            Some(raw) => match raw.split_once(';') {
                Some((id, rest)) => {
                    let timeout = rest
                        .trim()
                        .strip_prefix("timeout=")
                        .map(|t| t.trim().to_string());
                    (Some(id.trim().to_string()), timeout)
                }
                None => (Some(raw.trim().to_string()), None),
            },
            None => (None, None),
        };

        Ok(Reply {
            ok,
            cseq,
            session_id,
            session_timeout,
            headers,
            body,
            is_announce: false,
        })
    }
}

/// Find the byte length of one complete RTSP reply at the front of `buf`,
/// honoring `Content-Length` for a trailing body (spec.md §9 Open
/// Question 1: consume exactly the reply's bytes, not the whole read).
/// Returns `None` if the reply hasn't fully arrived yet.
pub fn framed_reply_len(buf: &[u8]) -> Option<usize> {
    let text = String::from_utf8_lossy(buf);
    let header_end = text.find("\r\n\r\n")?;
    let headers_len = header_end + 4;

    let content_length = text[..header_end]
        .lines()
        .find_map(|line| line.split_once(':').filter(|(k, _)| k.trim().eq_ignore_ascii_case("Content-Length")))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let total = headers_len + content_length;
    if buf.len() < total {
        None
    } else {
        Some(total)
    }
}
