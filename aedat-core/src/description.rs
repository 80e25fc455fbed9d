//! Parsing of the XML stream description stored in the file header.
//!
//! The description lists every output stream of the recording:
//!
//! ```xml
//! <dv version="2.0">
//!   <node name="outputs" path="/mainloop/Recorder/outputs/">
//!     <node name="0" path="/mainloop/Recorder/outputs/0/">
//!       <attr key="typeIdentifier" type="string">EVTS</attr>
//!       <node name="info" path="/mainloop/Recorder/outputs/0/info/">
//!         <attr key="sizeX" type="int">346</attr>
//!         <attr key="sizeY" type="int">260</attr>
//!       </node>
//!     </node>
//!   </node>
//! </dv>
//! ```

use crate::decoder::DecodeError;
use crate::types::{Stream, StreamContent};
use roxmltree::Node;
use std::collections::HashMap;

/// Parses a stream description into a table keyed by stream id.
pub fn parse_description(xml: &str) -> Result<HashMap<u32, Stream>, DecodeError> {
    let document = roxmltree::Document::parse(xml).map_err(|e| {
        DecodeError::InvalidFormat(format!("Failed to parse stream description: {}", e))
    })?;

    let root = document.root_element();
    if !root.has_tag_name("dv") {
        return Err(DecodeError::InvalidFormat(format!(
            "expected <dv> as description root, found <{}>",
            root.tag_name().name()
        )));
    }

    let mut streams = HashMap::new();

    for outputs in root.children().filter(|n| is_named_node(n, "outputs")) {
        for stream_node in outputs.children().filter(|n| n.has_tag_name("node")) {
            let name = stream_node.attribute("name").unwrap_or_default();
            let Ok(stream_id) = name.parse::<u32>() else {
                return Err(DecodeError::InvalidFormat(format!("invalid stream id {:?}", name)));
            };

            let stream = parse_stream(stream_id, &stream_node)?;
            log::debug!(
                "stream {}: {:?} ({:?}x{:?})",
                stream_id,
                stream.content,
                stream.width,
                stream.height
            );
            streams.insert(stream_id, stream);
        }
    }

    Ok(streams)
}

fn is_named_node(node: &Node, name: &str) -> bool {
    node.has_tag_name("node") && node.attribute("name") == Some(name)
}

fn parse_stream(stream_id: u32, node: &Node) -> Result<Stream, DecodeError> {
    let mut identifier = None;
    let mut width = None;
    let mut height = None;

    for child in node.children() {
        if child.has_tag_name("attr") && child.attribute("key") == Some("typeIdentifier") {
            identifier = child.text().map(str::trim);
        } else if is_named_node(&child, "info") {
            for info in child.children().filter(|n| n.has_tag_name("attr")) {
                match info.attribute("key") {
                    Some("sizeX") => width = Some(parse_size(&info)?),
                    Some("sizeY") => height = Some(parse_size(&info)?),
                    _ => {}
                }
            }
        }
    }

    let identifier = identifier.ok_or_else(|| {
        DecodeError::InvalidFormat(format!("stream {} has no typeIdentifier", stream_id))
    })?;
    let content = StreamContent::from_identifier(identifier).ok_or_else(|| {
        DecodeError::InvalidFormat(format!(
            "stream {} has unsupported type identifier {:?}",
            stream_id, identifier
        ))
    })?;

    Ok(Stream {
        content,
        width,
        height,
    })
}

fn parse_size(node: &Node) -> Result<u16, DecodeError> {
    let text = node.text().map(str::trim).unwrap_or_default();
    text.parse()
        .map_err(|_| DecodeError::InvalidFormat(format!("invalid sensor size {:?}", text)))
}
