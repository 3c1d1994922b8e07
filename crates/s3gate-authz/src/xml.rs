//! XML response bodies.
//!
//! S3 errors are a flat `<Error>` element. STS responses and errors are
//! wrapped in a namespaced `<...Response>` root, as the query protocol does.

use std::io::{self, Write};

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesText, Event};

/// The STS XML namespace.
pub const STS_NAMESPACE: &str = "https://sts.amazonaws.com/doc/2011-06-15/";

/// Errors raised while writing XML.
#[derive(Debug, thiserror::Error)]
pub enum XmlError {
    /// An I/O error during XML writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Format an S3 error as XML.
///
/// ```xml
/// <?xml version="1.0" encoding="UTF-8"?>
/// <Error>
///   <Code>AccessDenied</Code>
///   <Message>Access Denied.</Message>
///   <Resource>/mybucket</Resource>
///   <RequestId>...</RequestId>
/// </Error>
/// ```
#[must_use]
pub fn error_to_xml(
    code: &str,
    message: &str,
    resource: Option<&str>,
    request_id: &str,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    if let Err(e) = write_error_xml(&mut buf, code, message, resource, request_id) {
        tracing::error!(error = %e, "failed to serialize error XML");
        buf.clear();
    }
    buf
}

fn write_error_xml(
    buf: &mut Vec<u8>,
    code: &str,
    message: &str,
    resource: Option<&str>,
    request_id: &str,
) -> io::Result<()> {
    let mut writer = Writer::new(buf);
    write_decl(&mut writer)?;
    writer.create_element("Error").write_inner_content(|w| {
        write_text_element(w, "Code", code)?;
        write_text_element(w, "Message", message)?;
        if let Some(res) = resource {
            write_text_element(w, "Resource", res)?;
        }
        write_text_element(w, "RequestId", request_id)
    })?;
    Ok(())
}

/// Format an STS error as an `<ErrorResponse>` document.
#[must_use]
pub fn sts_error_to_xml(code: &str, message: &str, request_id: &str) -> Vec<u8> {
    let mut buf = Vec::with_capacity(256);
    let result = (|| -> io::Result<()> {
        let mut writer = Writer::new(&mut buf);
        write_decl(&mut writer)?;
        writer
            .create_element("ErrorResponse")
            .with_attribute(("xmlns", STS_NAMESPACE))
            .write_inner_content(|w| {
                w.create_element("Error").write_inner_content(|w| {
                    write_text_element(w, "Type", "Sender")?;
                    write_text_element(w, "Code", code)?;
                    write_text_element(w, "Message", message)
                })?;
                write_text_element(w, "RequestId", request_id)
            })?;
        Ok(())
    })();
    if let Err(e) = result {
        tracing::error!(error = %e, "failed to serialize STS error XML");
        buf.clear();
    }
    buf
}

/// Write a namespaced STS `<{action}Response>` document.
///
/// `result` writes the children of `<{action}Result>`; a
/// `<ResponseMetadata>` block carrying `request_id` follows it.
pub fn sts_response_to_xml<F>(action: &str, request_id: &str, result: F) -> Result<Vec<u8>, XmlError>
where
    F: FnOnce(&mut Writer<&mut Vec<u8>>) -> io::Result<()>,
{
    let mut buf = Vec::with_capacity(1024);
    let mut writer = Writer::new(&mut buf);
    write_decl(&mut writer)?;
    writer
        .create_element(format!("{action}Response"))
        .with_attribute(("xmlns", STS_NAMESPACE))
        .write_inner_content(|w| {
            w.create_element(format!("{action}Result"))
                .write_inner_content(result)?;
            w.create_element("ResponseMetadata")
                .write_inner_content(|w| write_text_element(w, "RequestId", request_id))?;
            Ok(())
        })?;
    Ok(buf)
}

fn write_decl<W: Write>(writer: &mut Writer<W>) -> io::Result<()> {
    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
}

/// Write a simple `<tag>text</tag>` element.
pub(crate) fn write_text_element<W: Write>(
    writer: &mut Writer<W>,
    tag: &str,
    text: &str,
) -> io::Result<()> {
    writer
        .create_element(tag)
        .write_text_content(BytesText::new(text))?;
    Ok(())
}
