//! Reconstruction of the page -> block -> paragraph -> line -> word hierarchy
//! from the flat OCR token stream.
//!
//! The engine emits tokens in document order with a level tag; a line belongs
//! to the block/paragraph enumerated immediately before it. One scan over the
//! stream with a level "stack" (the currently open node at each level)
//! rebuilds the tree without parent pointers. Missing intermediate parents
//! are synthesized so a malformed stream still yields a usable tree.

use crate::models::{BoundingBox, TextToken, TokenLevel};

#[derive(Debug, Clone, PartialEq)]
pub struct Word {
    pub bbox: BoundingBox,
    pub confidence: f32,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Line {
    pub bbox: Option<BoundingBox>,
    pub words: Vec<Word>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Paragraph {
    pub bbox: Option<BoundingBox>,
    pub lines: Vec<Line>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Block {
    pub bbox: Option<BoundingBox>,
    pub paragraphs: Vec<Paragraph>,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Page {
    pub bbox: Option<BoundingBox>,
    pub blocks: Vec<Block>,
}

impl Page {
    /// All words of the page in reading order.
    pub fn words(&self) -> impl Iterator<Item = &Word> {
        self.blocks
            .iter()
            .flat_map(|b| &b.paragraphs)
            .flat_map(|p| &p.lines)
            .flat_map(|l| &l.words)
    }
}

/// Build the typed tree from the flat stream. Tokens are never dropped for
/// low confidence; every word row ends up in the tree.
pub fn build(tokens: &[TextToken]) -> Vec<Page> {
    let mut pages: Vec<Page> = Vec::new();

    for token in tokens {
        match token.level {
            TokenLevel::Page => pages.push(Page {
                bbox: Some(token.bbox),
                blocks: Vec::new(),
            }),
            TokenLevel::Block => {
                open_page(&mut pages).blocks.push(Block {
                    bbox: Some(token.bbox),
                    paragraphs: Vec::new(),
                });
            }
            TokenLevel::Paragraph => {
                open_block(&mut pages).paragraphs.push(Paragraph {
                    bbox: Some(token.bbox),
                    lines: Vec::new(),
                });
            }
            TokenLevel::Line => {
                open_paragraph(&mut pages).lines.push(Line {
                    bbox: Some(token.bbox),
                    words: Vec::new(),
                });
            }
            TokenLevel::Word => {
                open_line(&mut pages).words.push(Word {
                    bbox: token.bbox,
                    confidence: token.confidence,
                    text: token.text.clone(),
                });
            }
        }
    }

    pages
}

fn open_page(pages: &mut Vec<Page>) -> &mut Page {
    if pages.is_empty() {
        pages.push(Page::default());
    }
    pages.last_mut().expect("at least one page")
}

fn open_block(pages: &mut Vec<Page>) -> &mut Block {
    let page = open_page(pages);
    if page.blocks.is_empty() {
        page.blocks.push(Block::default());
    }
    page.blocks.last_mut().expect("at least one block")
}

fn open_paragraph(pages: &mut Vec<Page>) -> &mut Paragraph {
    let block = open_block(pages);
    if block.paragraphs.is_empty() {
        block.paragraphs.push(Paragraph::default());
    }
    block.paragraphs.last_mut().expect("at least one paragraph")
}

fn open_line(pages: &mut Vec<Page>) -> &mut Line {
    let paragraph = open_paragraph(pages);
    if paragraph.lines.is_empty() {
        paragraph.lines.push(Line::default());
    }
    paragraph.lines.last_mut().expect("at least one line")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(level: TokenLevel, x: u32, conf: f32, text: &str) -> TextToken {
        TextToken {
            level,
            bbox: BoundingBox::new(x, 0, 10, 10),
            confidence: conf,
            text: text.to_string(),
        }
    }

    #[test]
    fn stream_rebuilds_nested_tree() {
        use TokenLevel::*;
        let tokens = vec![
            token(Page, 0, -1.0, ""),
            token(Block, 1, -1.0, ""),
            token(Paragraph, 2, -1.0, ""),
            token(Line, 3, -1.0, ""),
            token(Word, 4, 91.0, "TOTAL"),
            token(Word, 5, 88.0, "12,000"),
            token(Line, 6, -1.0, ""),
            token(Word, 7, 45.0, "CARD"),
            token(Block, 8, -1.0, ""),
            token(Paragraph, 9, -1.0, ""),
            token(Line, 10, -1.0, ""),
            token(Word, 11, 77.0, "THANKS"),
        ];

        let pages = build(&tokens);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].blocks.len(), 2);

        let first_block = &pages[0].blocks[0];
        assert_eq!(first_block.paragraphs[0].lines.len(), 2);
        assert_eq!(first_block.paragraphs[0].lines[0].words[0].text, "TOTAL");
        // The second line attaches to the block enumerated before it.
        assert_eq!(first_block.paragraphs[0].lines[1].words[0].text, "CARD");
        assert_eq!(
            pages[0].blocks[1].paragraphs[0].lines[0].words[0].text,
            "THANKS"
        );
        assert_eq!(pages[0].words().count(), 4);
    }

    #[test]
    fn low_confidence_words_are_kept() {
        use TokenLevel::*;
        let tokens = vec![
            token(Page, 0, -1.0, ""),
            token(Block, 1, -1.0, ""),
            token(Paragraph, 2, -1.0, ""),
            token(Line, 3, -1.0, ""),
            token(Word, 4, 3.0, "smudge"),
        ];
        let pages = build(&tokens);
        assert_eq!(pages[0].words().count(), 1);
    }

    #[test]
    fn missing_parents_are_synthesized() {
        // A word arriving with no preceding structure still lands in a tree.
        let tokens = vec![token(TokenLevel::Word, 0, 70.0, "orphan")];
        let pages = build(&tokens);
        assert_eq!(pages.len(), 1);
        assert_eq!(pages[0].blocks[0].paragraphs[0].lines[0].words[0].text, "orphan");
        assert_eq!(pages[0].bbox, None);
    }
}
