//! 复用输出缓冲区，避免高并发下反复分配大块内存。

use std::ops::{Deref, DerefMut};

use parking_lot::Mutex;

const DEFAULT_MAX_POOLED: usize = 16;
// 超过该容量的缓冲区归还时直接丢弃
const DEFAULT_MAX_RETAINED_CAPACITY: usize = 1 << 20;

#[derive(Debug)]
pub struct BufferPool {
    buffers: Mutex<Vec<Vec<u8>>>,
    max_pooled: usize,
    max_retained_capacity: usize,
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_POOLED, DEFAULT_MAX_RETAINED_CAPACITY)
    }
}

impl BufferPool {
    pub fn new(max_pooled: usize, max_retained_capacity: usize) -> Self {
        Self {
            buffers: Mutex::new(Vec::new()),
            max_pooled,
            max_retained_capacity,
        }
    }

    /// 取出一个已清空的缓冲区。守卫被 drop 时（包括出错提前返回）自动归还。
    pub fn acquire(&self) -> PooledBuffer<'_> {
        let mut buffer = self.buffers.lock().pop().unwrap_or_default();
        buffer.clear();
        PooledBuffer {
            pool: self,
            buffer: Some(buffer),
        }
    }

    pub fn idle_count(&self) -> usize {
        self.buffers.lock().len()
    }

    fn release(&self, buffer: Vec<u8>) {
        if buffer.capacity() > self.max_retained_capacity {
            return;
        }
        let mut buffers = self.buffers.lock();
        if buffers.len() < self.max_pooled {
            buffers.push(buffer);
        }
    }
}

pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buffer: Option<Vec<u8>>,
}

impl PooledBuffer<'_> {
    /// 以 UTF-8 字符串的形式复制出当前内容，缓冲区本身仍会归还。
    pub fn to_utf8_string(&self) -> Result<String, std::string::FromUtf8Error> {
        String::from_utf8(self.to_vec())
    }
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<u8>;

    fn deref(&self) -> &Vec<u8> {
        // 只有 drop 时才会取走
        self.buffer.as_ref().expect("缓冲区已归还")
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Vec<u8> {
        self.buffer.as_mut().expect("缓冲区已归还")
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        if let Some(buffer) = self.buffer.take() {
            self.pool.release(buffer);
        }
    }
}
