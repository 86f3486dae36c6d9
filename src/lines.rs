use std::io::{self, BufRead};

/// Splits a byte stream into text lines on `\n`, `\r\n` and a lone `\r`.
///
/// The encoder redraws its status line with bare carriage returns, so
/// splitting on `\n` alone would hold those updates back until the next
/// newline. Invalid UTF-8 is replaced rather than treated as an error.
pub struct Lines<R> {
    reader: R,
    pending_cr: bool,
}

impl<R: BufRead> Lines<R> {
    pub fn new(reader: R) -> Self {
        Lines { reader, pending_cr: false }
    }

    fn next_line(&mut self) -> io::Result<Option<String>> {
        let mut line = Vec::new();
        loop {
            let (consumed, done) = {
                let buf = match self.reader.fill_buf() {
                    Ok(buf) => buf,
                    Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                    Err(err) => return Err(err),
                };
                if buf.is_empty() {
                    return Ok(if line.is_empty() { None } else { Some(decode(line)) });
                }

                let mut start = 0;
                if self.pending_cr {
                    self.pending_cr = false;
                    if buf[0] == b'\n' {
                        start = 1;
                    }
                }

                match buf[start..].iter().position(|b| *b == b'\n' || *b == b'\r') {
                    Some(i) => {
                        let end = start + i;
                        line.extend_from_slice(&buf[start..end]);
                        self.pending_cr = buf[end] == b'\r';
                        (end + 1, true)
                    },
                    None => {
                        line.extend_from_slice(&buf[start..]);
                        (buf.len(), false)
                    },
                }
            };
            self.reader.consume(consumed);
            if done {
                return Ok(Some(decode(line)));
            }
        }
    }
}

impl<R: BufRead> Iterator for Lines<R> {
    type Item = io::Result<String>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_line().transpose()
    }
}

fn decode(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(s) => s,
        Err(err) => String::from_utf8_lossy(err.as_bytes()).into_owned(),
    }
}
