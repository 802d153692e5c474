use crate::core::timefmt;
use crate::domain::model::{ChannelLineup, ProgrammeRecord};
use crate::utils::error::Result;
use chrono_tz::Tz;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Cursor;

/// Serialize the guide: for each lineup channel (display-name order) a
/// `<channel>` element followed by that channel's programmes sorted by
/// start time. Programmes always reference a channel declared earlier.
pub fn render_document(
    lineup: &ChannelLineup,
    programmes: &[ProgrammeRecord],
    tz: Tz,
) -> Result<Vec<u8>> {
    let mut writer = Writer::new_with_indent(Cursor::new(Vec::new()), b' ', 2);

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(BytesStart::new("tv")))?;

    for (name, channel_id) in lineup.iter() {
        let mut channel = BytesStart::new("channel");
        channel.push_attribute(("id", channel_id));
        writer.write_event(Event::Start(channel))?;
        write_text_element(&mut writer, "display-name", None, name)?;
        if let Some(url) = lineup.url_for(channel_id) {
            write_text_element(&mut writer, "url", None, url)?;
        }
        writer.write_event(Event::End(BytesEnd::new("channel")))?;

        let mut for_channel: Vec<&ProgrammeRecord> = programmes
            .iter()
            .filter(|programme| programme.channel_id == channel_id)
            .collect();
        // stable sort keeps upstream order for equal start times
        for_channel.sort_by_key(|programme| programme.start);

        for programme in for_channel {
            let start = timefmt::format_xmltv(programme.start, tz);
            let stop = timefmt::format_xmltv(programme.end, tz);
            let mut element = BytesStart::new("programme");
            element.push_attribute(("start", start.as_str()));
            element.push_attribute(("stop", stop.as_str()));
            element.push_attribute(("channel", programme.channel_id.as_str()));
            writer.write_event(Event::Start(element))?;
            write_text_element(&mut writer, "title", Some(("lang", "en")), &programme.title)?;
            write_text_element(
                &mut writer,
                "desc",
                Some(("lang", "en")),
                &programme.description,
            )?;
            writer.write_event(Event::End(BytesEnd::new("programme")))?;
        }
    }

    writer.write_event(Event::End(BytesEnd::new("tv")))?;
    Ok(writer.into_inner().into_inner())
}

fn write_text_element<W: std::io::Write>(
    writer: &mut Writer<W>,
    tag: &str,
    attribute: Option<(&str, &str)>,
    text: &str,
) -> Result<()> {
    let mut element = BytesStart::new(tag);
    if let Some(attribute) = attribute {
        element.push_attribute(attribute);
    }
    writer.write_event(Event::Start(element))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(tag)))?;
    Ok(())
}
