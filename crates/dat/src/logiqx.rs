//! Logiqx XML emission.
//!
//! The catalog *input* format is someone else's problem; this module only
//! renders a [`Dat`] (in practice: a fixdat) into the Logiqx dialect.
//! There is no XML crate anywhere in this workspace's dependency
//! neighbourhood and the dialect is flat enough that a push-writer with
//! correct escaping is less code than a serializer framework.

use crate::models::{Dat, Game, Rom};
use std::fmt::Write;

const DOCTYPE: &str = "<!DOCTYPE datafile PUBLIC \"-//Logiqx//DTD ROM Management Datafile//EN\" \"http://www.logiqx.com/Dats/datafile.dtd\">";

/// Render a catalog as a Logiqx `datafile` document.
pub fn to_xml(dat: &Dat) -> String {
    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\"?>\n");
    out.push_str(DOCTYPE);
    out.push_str("\n<datafile>\n\t<header>\n");
    text_element(&mut out, 2, "name", &dat.header.name);
    text_element(&mut out, 2, "description", &dat.header.description);
    text_element(&mut out, 2, "version", &dat.header.version);
    text_element(&mut out, 2, "date", &dat.header.date);
    if !dat.header.url.is_empty() {
        text_element(&mut out, 2, "url", &dat.header.url);
    }
    if !dat.header.comment.is_empty() {
        text_element(&mut out, 2, "comment", &dat.header.comment.join("\n"));
    }
    out.push_str("\t</header>\n");
    for game in &dat.games {
        game_element(&mut out, game);
    }
    out.push_str("</datafile>\n");
    out
}

fn game_element(out: &mut String, game: &Game) {
    out.push('\t');
    let tag = if game.is_machine { "machine" } else { "game" };
    let _ = write!(out, "<{tag} name=\"{}\"", escape(&game.name));
    if let Some(parent) = &game.clone_of {
        let _ = write!(out, " cloneof=\"{}\"", escape(parent));
    }
    if let Some(bios) = &game.rom_of {
        let _ = write!(out, " romof=\"{}\"", escape(bios));
    }
    out.push_str(">\n");
    let description = game.description.as_deref().unwrap_or(&game.name);
    text_element(out, 2, "description", description);
    for device_ref in &game.device_refs {
        let _ = writeln!(out, "\t\t<device_ref name=\"{}\"/>", escape(device_ref));
    }
    for rom in &game.roms {
        rom_element(out, rom);
    }
    let _ = writeln!(out, "\t</{tag}>");
}

fn rom_element(out: &mut String, rom: &Rom) {
    let _ = write!(out, "\t\t<rom name=\"{}\" size=\"{}\" crc=\"{}\"", escape(&rom.name), rom.size, escape(&rom.crc));
    if let Some(merge) = &rom.merge {
        let _ = write!(out, " merge=\"{}\"", escape(merge));
    }
    if rom.bios {
        out.push_str(" bios=\"yes\"");
    }
    out.push_str("/>\n");
}

fn text_element(out: &mut String, depth: usize, tag: &str, value: &str) {
    for _ in 0..depth {
        out.push('\t');
    }
    let _ = writeln!(out, "<{tag}>{}</{tag}>", escape(value));
}

/// Escape the five XML metacharacters. Quotes only matter inside
/// attributes but escaping them everywhere is harmless and keeps one
/// function doing one job.
fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
