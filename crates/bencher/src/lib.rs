#[derive(Debug, Copy, Clone)]
pub struct TestCase {
    name: &'static str,
    group: TestGroup,
    payload: TestPayload,
}

impl TestCase {
    pub fn new(name: &'static str, group: TestGroup, payload: TestPayload) -> Self {
        Self { name, group, payload }
    }

    pub fn small(name: &'static str, payload: TestPayload) -> Self {
        Self::new(name, TestGroup::Small, payload)
    }

    pub fn normal(name: &'static str, payload: TestPayload) -> Self {
        Self::new(name, TestGroup::Normal, payload)
    }

    pub fn large(name: &'static str, payload: TestPayload) -> Self {
        Self::new(name, TestGroup::Large, payload)
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> TestGroup {
        self.group
    }

    pub fn payload(&self) -> &TestPayload {
        &self.payload
    }
}

/// A body of `len` bytes written in slices of `chunk_size`.
#[derive(Debug, Copy, Clone)]
pub struct TestPayload {
    len: usize,
    chunk_size: usize,
}

impl TestPayload {
    pub const fn new(len: usize, chunk_size: usize) -> Self {
        Self { len, chunk_size }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Printable ascii, so the same bytes can be pushed through a text codec.
    pub fn content(&self) -> Vec<u8> {
        (b'a'..=b'z').cycle().take(self.len).collect()
    }
}

#[derive(Clone, Copy, Debug)]
pub enum TestGroup {
    Small,
    Normal,
    Large,
}
