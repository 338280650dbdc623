//! A multipart form builder.
//!
//! `reqwest::multipart` already implements the wire encoding; this module
//! is the thin, validating layer the core talks to, matching §4.7's part
//! taxonomy (string / file / streaming-file / buffer fields) and its
//! "needs a read-callback" flag, which here just means "at least one part
//! has to be read from disk or a [`Reader`] before the request can be
//! built" rather than anything reqwest needs telling explicitly.

use std::path::PathBuf;

use crate::error::{Error, ErrorKind, Result};
use crate::io::{ReadOutcome, Reader};

enum FormPart {
    Text {
        name: String,
        value: String,
    },
    Buffer {
        name: String,
        filename: Option<String>,
        bytes: Vec<u8>,
        content_type: Option<String>,
    },
    /// Mandatory `filename` works around a downstream server bug that
    /// mishandles file parts with no filename attribute.
    File {
        name: String,
        path: PathBuf,
        filename: String,
    },
    StreamingFile {
        name: String,
        filename: String,
        content_length: u64,
        reader: Box<dyn Reader>,
    },
}

#[derive(Default)]
pub struct FormBuilder {
    parts: Vec<FormPart>,
}

fn check_name(name: &str, kind: ErrorKind) -> Result<()> {
    if name.is_empty() {
        Err(Error::new(kind, "form field name must not be empty"))
    } else {
        Ok(())
    }
}

impl FormBuilder {
    pub fn new() -> Self {
        FormBuilder::default()
    }

    pub fn add_text(&mut self, name: impl Into<String>, value: impl Into<String>) -> Result<()> {
        let name = name.into();
        check_name(&name, ErrorKind::HttpAddingStringFieldFailed)?;
        self.parts.push(FormPart::Text {
            name,
            value: value.into(),
        });
        Ok(())
    }

    pub fn add_buffer(
        &mut self,
        name: impl Into<String>,
        filename: Option<String>,
        bytes: Vec<u8>,
        content_type: Option<String>,
    ) -> Result<()> {
        let name = name.into();
        check_name(&name, ErrorKind::HttpAddingBufferFieldFailed)?;
        self.parts.push(FormPart::Buffer {
            name,
            filename,
            bytes,
            content_type,
        });
        Ok(())
    }

    pub fn add_file(
        &mut self,
        name: impl Into<String>,
        path: impl Into<PathBuf>,
        filename: impl Into<String>,
    ) -> Result<()> {
        let name = name.into();
        check_name(&name, ErrorKind::HttpAddingFileFieldFailed)?;
        let path = path.into();
        if !path.is_file() {
            return Err(Error::new(
                ErrorKind::HttpAddingFileFieldFailed,
                format!("{} is not a regular file", path.display()),
            ));
        }
        self.parts.push(FormPart::File {
            name,
            path,
            filename: filename.into(),
        });
        Ok(())
    }

    pub fn add_streaming_file(
        &mut self,
        name: impl Into<String>,
        filename: impl Into<String>,
        content_length: u64,
        reader: Box<dyn Reader>,
    ) -> Result<()> {
        let name = name.into();
        check_name(&name, ErrorKind::HttpAddingFileFieldFailed)?;
        self.parts.push(FormPart::StreamingFile {
            name,
            filename: filename.into(),
            content_length,
            reader,
        });
        Ok(())
    }

    /// Whether at least one part requires draining a file or reader
    /// before the request body exists.
    pub fn needs_read_callback(&self) -> bool {
        self.parts.iter().any(|p| {
            matches!(p, FormPart::File { .. } | FormPart::StreamingFile { .. })
        })
    }

    pub async fn into_reqwest_form(self) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in self.parts {
            form = match part {
                FormPart::Text { name, value } => form.text(name, value),
                FormPart::Buffer {
                    name,
                    filename,
                    bytes,
                    content_type,
                } => {
                    let mut rq_part = reqwest::multipart::Part::bytes(bytes);
                    if let Some(fname) = filename {
                        rq_part = rq_part.file_name(fname);
                    }
                    if let Some(ct) = content_type {
                        rq_part = rq_part
                            .mime_str(&ct)
                            .map_err(|e| Error::new(ErrorKind::HttpAddingBufferFieldFailed, e.to_string()))?;
                    }
                    form.part(name, rq_part)
                }
                FormPart::File {
                    name,
                    path,
                    filename,
                } => {
                    let bytes = tokio::fs::read(&path).await.map_err(|e| {
                        Error::new(ErrorKind::FileReadingFailed, format!("{}: {}", path.display(), e))
                    })?;
                    let rq_part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
                    form.part(name, rq_part)
                }
                FormPart::StreamingFile {
                    name,
                    filename,
                    content_length,
                    reader,
                } => {
                    let bytes = drain_reader(reader, content_length)?;
                    let rq_part = reqwest::multipart::Part::bytes(bytes).file_name(filename);
                    form.part(name, rq_part)
                }
            };
        }
        Ok(form)
    }
}

fn drain_reader(mut reader: Box<dyn Reader>, expected_len: u64) -> Result<Vec<u8>> {
    let mut buf = Vec::with_capacity(expected_len.min(16 * 1024 * 1024) as usize);
    let mut chunk = [0u8; 64 * 1024];
    loop {
        match reader.read(&mut chunk)? {
            ReadOutcome::Data(n) => buf.extend_from_slice(&chunk[..n]),
            ReadOutcome::Eof => break,
            ReadOutcome::Aborted => {
                return Err(Error::new(
                    ErrorKind::StorPuttingAbortedByFilter,
                    "streaming file field read was aborted",
                ))
            }
        }
    }
    if buf.len() as u64 != expected_len {
        return Err(Error::new(
            ErrorKind::HttpMismatchingFileSize,
            format!("expected {} bytes, read {}", expected_len, buf.len()),
        ));
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_empty_field_name() {
        let mut form = FormBuilder::new();
        assert!(form.add_text("", "x").is_err());
    }

    #[test]
    fn streaming_parts_require_a_read_callback() {
        let mut form = FormBuilder::new();
        form.add_text("token", "abc").unwrap();
        assert!(!form.needs_read_callback());
    }
}
