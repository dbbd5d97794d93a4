/// Theme and master style parsing.
use crate::error::{Error, Result};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use std::collections::BTreeMap;

const CLR_SLOTS: [&[u8]; 12] = [
    b"dk1", b"lt1", b"dk2", b"lt2", b"accent1", b"accent2", b"accent3", b"accent4", b"accent5",
    b"accent6", b"hlink", b"folHlink",
];

/// Color and font scheme pulled from a theme part.
#[derive(Debug, Clone, Default)]
pub struct ThemeScheme {
    pub major_font: Option<String>,
    pub minor_font: Option<String>,
    /// Scheme slot name to sRGB hex, e.g. "accent1" -> "4472C4".
    pub colors: BTreeMap<String, String>,
}

impl ThemeScheme {
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);
        let mut scheme = Self::default();

        // State for the two sub-schemes being walked.
        let mut clr_slot: Option<String> = None;
        let mut in_clr_scheme = false;
        let mut font_slot: Option<bool> = None; // Some(true) = majorFont

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    let local = e.local_name().as_ref().to_vec();
                    match local.as_slice() {
                        b"clrScheme" => in_clr_scheme = true,
                        b"majorFont" => font_slot = Some(true),
                        b"minorFont" => font_slot = Some(false),
                        b"latin" => {
                            let typeface = attr_value(e, b"typeface")?;
                            match font_slot {
                                Some(true) if scheme.major_font.is_none() => {
                                    scheme.major_font = typeface;
                                }
                                Some(false) if scheme.minor_font.is_none() => {
                                    scheme.minor_font = typeface;
                                }
                                _ => {}
                            }
                        }
                        b"srgbClr" => {
                            if let (Some(slot), Some(val)) =
                                (clr_slot.as_ref(), attr_value(e, b"val")?)
                            {
                                scheme.colors.entry(slot.clone()).or_insert(val);
                            }
                        }
                        b"sysClr" => {
                            if let (Some(slot), Some(val)) =
                                (clr_slot.as_ref(), attr_value(e, b"lastClr")?)
                            {
                                scheme.colors.entry(slot.clone()).or_insert(val);
                            }
                        }
                        other if in_clr_scheme && CLR_SLOTS.contains(&other) => {
                            clr_slot = Some(String::from_utf8_lossy(other).into_owned());
                        }
                        _ => {}
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"clrScheme" => {
                        in_clr_scheme = false;
                        clr_slot = None;
                    }
                    b"majorFont" | b"minorFont" => font_slot = None,
                    other if in_clr_scheme && CLR_SLOTS.contains(&other) => clr_slot = None,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e.to_string())),
                _ => {}
            }
        }

        Ok(scheme)
    }

}

/// Default character sizes from the slide master's `p:txStyles`.
#[derive(Debug, Clone, Default)]
pub struct MasterTextStyles {
    pub title_size_pt: Option<f32>,
    pub body_size_pt: Option<f32>,
    pub other_size_pt: Option<f32>,
}

impl MasterTextStyles {
    /// Parse a slide master part, reading the level-1 default run size of
    /// each style family.
    pub fn parse(xml: &[u8]) -> Result<Self> {
        let mut reader = Reader::from_reader(xml);
        reader.config_mut().trim_text(true);
        let mut styles = Self::default();

        let mut family: Option<u8> = None; // 0 title, 1 body, 2 other
        let mut in_lvl1 = false;
        let mut in_tx_styles = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(ref e)) | Ok(Event::Empty(ref e)) => {
                    match e.local_name().as_ref() {
                        b"txStyles" => in_tx_styles = true,
                        b"titleStyle" if in_tx_styles => family = Some(0),
                        b"bodyStyle" if in_tx_styles => family = Some(1),
                        b"otherStyle" if in_tx_styles => family = Some(2),
                        b"lvl1pPr" => in_lvl1 = true,
                        b"defRPr" if in_lvl1 => {
                            let size = attr_value(e, b"sz")?
                                .and_then(|v| v.parse::<i32>().ok())
                                .map(|hundredths| hundredths as f32 / 100.0);
                            if size.is_some() {
                                match family {
                                    Some(0) if styles.title_size_pt.is_none() => {
                                        styles.title_size_pt = size;
                                    }
                                    Some(1) if styles.body_size_pt.is_none() => {
                                        styles.body_size_pt = size;
                                    }
                                    Some(2) if styles.other_size_pt.is_none() => {
                                        styles.other_size_pt = size;
                                    }
                                    _ => {}
                                }
                            }
                        }
                        _ => {}
                    }
                }
                Ok(Event::End(e)) => match e.local_name().as_ref() {
                    b"txStyles" => in_tx_styles = false,
                    b"titleStyle" | b"bodyStyle" | b"otherStyle" => family = None,
                    b"lvl1pPr" => in_lvl1 = false,
                    _ => {}
                },
                Ok(Event::Eof) => break,
                Err(e) => return Err(Error::Xml(e.to_string())),
                _ => {}
            }
        }

        Ok(styles)
    }
}

fn attr_value(e: &BytesStart<'_>, key: &[u8]) -> Result<Option<String>> {
    for attr in e.attributes().flatten() {
        if attr.key.as_ref() == key || attr.key.local_name().as_ref() == key {
            let value = attr
                .unescape_value()
                .map_err(|e| Error::Xml(e.to_string()))?;
            return Ok(Some(value.into_owned()));
        }
    }
    Ok(None)
}
