use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub content: String,
}

impl Page {
    pub fn new(content: impl Into<String>) -> Self {
        Self { content: content.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Page>", into = "Vec<Page>")]
pub struct PageBuffer {
    pages: Vec<Page>,
}

impl Default for PageBuffer {
    fn default() -> Self {
        Self { pages: vec![Page::default()] }
    }
}

impl From<Vec<Page>> for PageBuffer {
    fn from(pages: Vec<Page>) -> Self {
        if pages.is_empty() {
            return Self::default();
        }

        Self { pages }
    }
}

impl From<PageBuffer> for Vec<Page> {
    fn from(buffer: PageBuffer) -> Self {
        buffer.pages
    }
}

impl PageBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }

    pub fn add_page(&mut self) -> usize {
        self.pages.push(Page::default());
        self.pages.len() - 1
    }

    pub fn update_page_content(&mut self, index: usize, text: impl Into<String>) -> bool {
        let Some(page) = self.pages.get_mut(index) else {
            return false;
        };

        page.content = text.into();
        true
    }

    pub fn delete_page(&mut self, index: usize) -> bool {
        if self.pages.len() <= 1 || index >= self.pages.len() {
            return false;
        }

        self.pages.remove(index);
        true
    }

    pub fn page(&self, index: usize) -> Option<&Page> {
        self.pages.get(index)
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn all(&self) -> Vec<Page> {
        self.pages.clone()
    }

    pub fn contents(&self) -> Vec<&str> {
        self.pages.iter().map(|page| page.content.as_str()).collect()
    }

    /// Appends `text` to every page in `range`, or to none of them when the
    /// range reaches past the end of the buffer.
    pub fn append_to_range(&mut self, range: Range<usize>, text: &str) -> bool {
        if range.is_empty() || range.end > self.pages.len() {
            return false;
        }

        for page in &mut self.pages[range] {
            page.content.push_str(text);
        }

        true
    }

    pub fn replace_all(&mut self, pages: Vec<Page>) {
        *self = Self::from(pages);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_buffer_holds_one_blank_page() {
        let buffer = PageBuffer::new();
        assert_eq!(buffer.len(), 1);
        assert_eq!(buffer.page(0), Some(&Page::default()));
    }

    #[test]
    fn add_page_grows_by_one_and_preserves_existing_pages() {
        let mut buffer = PageBuffer::new();
        buffer.update_page_content(0, "INT. KITCHEN");

        for expected_len in 2..=6 {
            let index = buffer.add_page();
            assert_eq!(index, expected_len - 1);
            assert_eq!(buffer.len(), expected_len);
            assert_eq!(buffer.page(0).map(|page| page.content.as_str()), Some("INT. KITCHEN"));
        }
    }

    #[test]
    fn update_out_of_range_is_a_noop() {
        let mut buffer = PageBuffer::new();
        assert!(!buffer.update_page_content(3, "lost"));
        assert_eq!(buffer.contents(), vec![""]);
    }

    #[test]
    fn all_returns_detached_copy() {
        let mut buffer = PageBuffer::new();
        let mut copy = buffer.all();
        copy[0].content.push_str("mutated");

        assert_eq!(buffer.page(0).map(|page| page.content.as_str()), Some(""));
        buffer.update_page_content(0, "x");
        assert_eq!(copy[0].content, "mutated");
    }

    #[test]
    fn last_page_cannot_be_deleted() {
        let mut buffer = PageBuffer::new();
        assert!(!buffer.delete_page(0));

        buffer.add_page();
        buffer.update_page_content(1, "second");
        assert!(buffer.delete_page(0));
        assert_eq!(buffer.contents(), vec!["second"]);
    }

    #[test]
    fn append_to_range_is_all_or_nothing() {
        let mut buffer = PageBuffer::from(vec![Page::new("a"), Page::new("b")]);
        assert!(!buffer.append_to_range(1..3, "!"));
        assert_eq!(buffer.contents(), vec!["a", "b"]);

        assert!(buffer.append_to_range(0..2, "!"));
        assert_eq!(buffer.contents(), vec!["a!", "b!"]);
    }

    #[test]
    fn empty_page_list_deserializes_to_one_blank_page() {
        let buffer: PageBuffer = serde_json::from_str("[]").expect("empty list should parse");
        assert_eq!(buffer.len(), 1);
    }
}
