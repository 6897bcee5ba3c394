//! Inline Run Formatter: text runs, format toggles, paragraph styles, notes
//! and breaks in the active story.

use crate::LayoutError;
use crate::composer::Composer;
use crate::state::LayoutState;
use crate::strategy::{attempt, describe_failures, try_in_order};
use galley_style::StyleCatalog;
use galley_traits::{BreakKind, CharFormat, DocumentHost, NoteKind, ParagraphFormat};
use galley_types::NoteId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A toggleable character attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InlineStyle {
    Bold,
    Italic,
    Underline,
    Strikethrough,
    Superscript,
    Subscript,
    SmallCaps,
}

impl FromStr for InlineStyle {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "b" | "bold" | "strong" => Ok(InlineStyle::Bold),
            "i" | "italic" | "em" => Ok(InlineStyle::Italic),
            "u" | "underline" => Ok(InlineStyle::Underline),
            "s" | "strike" | "strikethrough" => Ok(InlineStyle::Strikethrough),
            "sup" | "superscript" => Ok(InlineStyle::Superscript),
            "sub" | "subscript" => Ok(InlineStyle::Subscript),
            "sc" | "smallcaps" | "small-caps" => Ok(InlineStyle::SmallCaps),
            other => Err(format!("Unknown inline style: {}", other)),
        }
    }
}

/// The character attributes in effect for the next run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RunFormat {
    pub bold: bool,
    pub italic: bool,
    pub underline: bool,
    pub strikethrough: bool,
    pub superscript: bool,
    pub subscript: bool,
    pub small_caps: bool,
    pub char_style: Option<String>,
}

impl RunFormat {
    /// Turns `style` on or off. Superscript and subscript exclude each other.
    pub fn set(&mut self, style: InlineStyle, on: bool) {
        match style {
            InlineStyle::Bold => self.bold = on,
            InlineStyle::Italic => self.italic = on,
            InlineStyle::Underline => self.underline = on,
            InlineStyle::Strikethrough => self.strikethrough = on,
            InlineStyle::Superscript => {
                self.superscript = on;
                if on {
                    self.subscript = false;
                }
            }
            InlineStyle::Subscript => {
                self.subscript = on;
                if on {
                    self.superscript = false;
                }
            }
            InlineStyle::SmallCaps => self.small_caps = on,
        }
    }

    pub fn is_plain(&self) -> bool {
        *self == RunFormat::default()
    }

    /// Host formatting for a run, with the character style's attributes
    /// layered under the explicit toggles. Unknown character styles are
    /// created in `catalog`.
    pub fn to_char_format(&self, catalog: &mut StyleCatalog) -> CharFormat {
        let style = self.char_style.as_deref().map(|name| catalog.character_style(name));
        let style = style.as_ref();
        CharFormat {
            bold: self.bold || style.and_then(|s| s.bold).unwrap_or(false),
            italic: self.italic || style.and_then(|s| s.italic).unwrap_or(false),
            underline: self.underline || style.and_then(|s| s.underline).unwrap_or(false),
            strikethrough: self.strikethrough,
            superscript: self.superscript,
            subscript: self.subscript,
            small_caps: self.small_caps,
            char_style: style.map(|s| s.name.clone()),
            point_size: style.and_then(|s| s.point_size),
        }
    }
}

/// Where a note ended up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoteMarker {
    Footnote(NoteId),
    Endnote(NoteId),
    /// Neither note kind was accepted; a bracketed marker was written instead.
    Inline,
    /// A note with this id was already inserted.
    Duplicate,
}

impl<H: DocumentHost> Composer<H> {
    pub fn set_format(&mut self, style: InlineStyle, on: bool) {
        self.cursor.run_format.set(style, on);
    }

    /// Sets or clears the character style for following runs.
    pub fn set_char_style(&mut self, name: Option<&str>) {
        self.cursor.run_format.char_style = name.map(str::to_string);
    }

    /// Requests a paragraph style for the next paragraph that receives text.
    pub fn request_paragraph_style(&mut self, name: &str) {
        self.cursor.next_paragraph_style = Some(name.to_string());
    }

    /// Appends a run of text in the current format.
    pub fn insert_run(&mut self, text: &str) -> Result<(), LayoutError> {
        if text.is_empty() {
            return Ok(());
        }
        if self.cursor.at_paragraph_start {
            if let Some(style) = self.cursor.next_paragraph_style.take() {
                self.apply_paragraph_style(&style)?;
            }
        }
        let format = self.cursor.run_format.to_char_format(&mut self.catalog);
        self.host.insert_text(self.cursor.story, text, &format)?;
        self.cursor.at_paragraph_start = false;
        Ok(())
    }

    /// Ends the current paragraph. Every `flush_every_paragraphs` paragraphs
    /// the story's overflow is resolved so long documents never pile up
    /// overset text.
    pub fn end_paragraph(&mut self) -> Result<(), LayoutError> {
        self.host.insert_break(self.cursor.story, BreakKind::Paragraph)?;
        self.cursor.at_paragraph_start = true;
        self.cursor.paragraphs_since_flush += 1;

        let every = self.config.flush_every_paragraphs;
        if every > 0 && self.cursor.paragraphs_since_flush >= every {
            self.cursor.paragraphs_since_flush = 0;
            let report = self.flush_overflow()?;
            if report.settled() {
                self.restore_pending_layout()?;
            }
        }
        Ok(())
    }

    /// Ends an open paragraph without counting it towards periodic flushes.
    pub(crate) fn close_paragraph(&mut self) -> Result<(), LayoutError> {
        if !self.cursor.at_paragraph_start {
            self.host.insert_break(self.cursor.story, BreakKind::Paragraph)?;
            self.cursor.at_paragraph_start = true;
        }
        Ok(())
    }

    /// Applies a named paragraph style to the current paragraph, creating the
    /// style from the default one when the catalog lacks it. A host refusal
    /// leaves the paragraph in its previous style.
    pub fn apply_paragraph_style(&mut self, name: &str) -> Result<(), LayoutError> {
        let style = self.catalog.paragraph_style(name);
        let format = ParagraphFormat {
            style: style.name.clone(),
            point_size: style.point_size,
            leading: style.leading_pt(),
            space_before: style.space_before,
            space_after: style.space_after,
            align: style.align,
        };
        if let Err(e) = self.host.set_paragraph_format(self.cursor.story, &format) {
            log::warn!("Could not apply paragraph style '{}': {}", name, e);
        }
        Ok(())
    }

    /// Inserts a note reference at the end of the story.
    ///
    /// Footnotes fall back to endnotes, and either falls back to a bracketed
    /// `[id]` marker in the text. A second note with the same kind and id is
    /// ignored.
    pub fn insert_note(&mut self, kind: NoteKind, id: u32, content: &str) -> Result<NoteMarker, LayoutError> {
        if !self.cursor.notes_seen.insert((kind, id)) {
            log::debug!("{:?} {} already inserted; ignoring repeat.", kind, id);
            return Ok(NoteMarker::Duplicate);
        }
        let story = self.cursor.story;

        let mut attempts = Vec::new();
        if kind == NoteKind::Footnote {
            attempts.push(attempt("footnote", move |h: &mut H| {
                h.insert_note(story, NoteKind::Footnote, content).map(NoteMarker::Footnote)
            }));
        }
        attempts.push(attempt("endnote", move |h: &mut H| {
            h.insert_note(story, NoteKind::Endnote, content).map(NoteMarker::Endnote)
        }));

        let marker = match try_in_order(&mut self.host, "note", attempts) {
            Ok((via, marker)) => {
                if via != "footnote" && kind == NoteKind::Footnote {
                    log::warn!("Footnote {} was inserted as an endnote.", id);
                }
                marker
            }
            Err(failures) => {
                log::warn!(
                    "Note {} could not be inserted ({}); writing an inline marker.",
                    id,
                    describe_failures(&failures)
                );
                let format = self.cursor.run_format.to_char_format(&mut self.catalog);
                self.host.insert_text(story, &format!("[{}]", id), &format)?;
                NoteMarker::Inline
            }
        };
        self.cursor.at_paragraph_start = false;
        Ok(marker)
    }

    /// Inserts a break. Paragraph breaks go through [`Composer::end_paragraph`].
    pub fn insert_break(&mut self, kind: BreakKind) -> Result<(), LayoutError> {
        if kind == BreakKind::Paragraph {
            return self.end_paragraph();
        }
        self.host.insert_break(self.cursor.story, kind)?;
        self.cursor.at_paragraph_start = true;
        Ok(())
    }

    /// Removes empty containers from the end of the active chain, and their
    /// pages when nothing else lives there. Does nothing unless
    /// `trim_trailing_empty` is configured. Returns the containers removed.
    pub fn trim_trailing_empty(&mut self) -> Result<usize, LayoutError> {
        if !self.config.trim_trailing_empty {
            return Ok(0);
        }
        let story = self.cursor.story;
        self.host.recompose(story)?;

        let mut removed = 0;
        loop {
            let chain = self.host.story_containers(story)?;
            let [.., previous, last] = chain.as_slice() else {
                break;
            };
            let (previous, last) = (*previous, *last);
            if !self.host.container_is_empty(last)? {
                break;
            }
            let page = self.host.container_page(last)?;
            self.host.remove_container(last)?;
            removed += 1;
            if self.host.page_is_empty(page)? {
                self.host.remove_page(page)?;
                log::debug!("Removed empty trailing {}.", page);
            }
            let previous_page = self.host.container_page(previous)?;
            self.cursor.advance_to(previous_page, previous);
            self.cursor.layout =
                LayoutState::from_page(self.host.page_bounds(previous_page)?, self.host.page_margins(previous_page)?);
        }
        if removed > 0 {
            self.host.recompose(story)?;
            log::info!("Trimmed {} empty trailing containers.", removed);
        }
        Ok(removed)
    }
}
