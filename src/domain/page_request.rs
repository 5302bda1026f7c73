pub const MAX_PAGE_SIZE: i64 = 1000;

/// One zero-based page of the subscriber listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    page: i64,
    count: i64,
}

impl PageRequest {
    pub fn parse(page: i64, count: i64) -> Result<PageRequest, String> {
        if page < 0 {
            return Err(format!("{} is not a valid page, pages start at 0", page));
        }

        if count <= 0 || count > MAX_PAGE_SIZE {
            return Err(format!(
                "{} is not a valid page size, it must be between 1 and {}",
                count, MAX_PAGE_SIZE
            ));
        }

        if page.checked_mul(count).is_none() {
            return Err(format!("page {} of size {} is out of range", page, count));
        }

        Ok(Self { page, count })
    }

    pub fn limit(&self) -> i64 {
        self.count
    }

    pub fn offset(&self) -> i64 {
        // Overflow is ruled out by parse
        self.page * self.count
    }
}
