use super::eventlog::LogEventList;
use super::groups::{GroupList, GroupUserList};
use super::models::Range;
use super::nodes::{DeletedNodeSummaryList, NodeList};
use super::users::{UserGroupList, UserList};
use crate::error::Result;

use futures::stream::{self, StreamExt, TryStreamExt};
use std::future::Future;
use tracing::debug;

/// DRACOON 单页返回的最大条目数。
pub const MAX_PAGE_SIZE: u64 = 500;
/// 同时在途的分页请求数。
pub const DEFAULT_PAGE_CONCURRENCY: usize = 3;

/// 带 `range` 与 `items` 的列表响应。
pub trait Paged {
    type Item;

    fn range(&self) -> &Range;
    fn items_mut(&mut self) -> &mut Vec<Self::Item>;
    fn into_items(self) -> Vec<Self::Item>;
}

macro_rules! impl_paged {
    ($($list:ty => $item:ty),* $(,)?) => {
        $(
            impl Paged for $list {
                type Item = $item;

                fn range(&self) -> &Range {
                    &self.range
                }

                fn items_mut(&mut self) -> &mut Vec<Self::Item> {
                    &mut self.items
                }

                fn into_items(self) -> Vec<Self::Item> {
                    self.items
                }
            }
        )*
    };
}

impl_paged!(
    UserList => super::users::User,
    UserGroupList => super::users::UserGroup,
    GroupList => super::groups::Group,
    GroupUserList => super::groups::GroupUser,
    NodeList => super::nodes::Node,
    DeletedNodeSummaryList => super::nodes::DeletedNodeSummary,
    LogEventList => super::eventlog::LogEvent,
);

/// 第一页之后还需要请求的 offset 列表。
/// `page_size` 为 0 时按 [`MAX_PAGE_SIZE`] 处理。
pub fn remaining_offsets(range: &Range) -> Vec<u64> {
    let page_size = if range.limit == 0 {
        MAX_PAGE_SIZE
    } else {
        range.limit
    };
    let start = range.offset + page_size;
    (start..range.total)
        .step_by(page_size as usize)
        .collect()
}

/// 异步拉取剩余分页，最多 `concurrency` 个请求同时进行，结果按 offset 顺序追加到第一页。
/// 任一页失败时立即返回该错误，其余未完成的请求被丢弃。
pub async fn collect_pages<P, F, Fut>(mut first: P, fetch: F, concurrency: usize) -> Result<P>
where
    P: Paged,
    F: Fn(u64) -> Fut,
    Fut: Future<Output = Result<P>>,
{
    let offsets = remaining_offsets(first.range());
    if offsets.is_empty() {
        return Ok(first);
    }
    debug!(
        pages = offsets.len(),
        total = first.range().total,
        "fetching remaining pages"
    );

    let pages: Vec<P> = stream::iter(offsets)
        .map(fetch)
        .buffered(concurrency.max(1))
        .try_collect()
        .await?;

    for page in pages {
        first.items_mut().extend(page.into_items());
    }
    Ok(first)
}

/// 同步版本：逐页顺序拉取。
pub fn collect_pages_blocking<P, F>(mut first: P, mut fetch: F) -> Result<P>
where
    P: Paged,
    F: FnMut(u64) -> Result<P>,
{
    for offset in remaining_offsets(first.range()) {
        let page = fetch(offset)?;
        first.items_mut().extend(page.into_items());
    }
    Ok(first)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::users::User;
    use crate::error::DracoonError;

    fn range(offset: u64, limit: u64, total: u64) -> Range {
        Range {
            offset,
            limit,
            total,
        }
    }

    fn user(id: i64) -> User {
        User {
            id,
            user_name: format!("user{id}"),
            first_name: None,
            last_name: None,
            email: None,
            phone: None,
            is_locked: None,
            avatar_uuid: None,
            expire_at: None,
            last_login_success_at: None,
            is_encryption_enabled: None,
            has_manageable_rooms: None,
            user_roles: None,
            auth_data: None,
        }
    }

    fn page(offset: u64, total: u64) -> UserList {
        UserList {
            range: range(offset, MAX_PAGE_SIZE, total),
            items: vec![user(offset as i64)],
        }
    }

    #[test]
    fn offsets_for_large_listing() {
        assert_eq!(remaining_offsets(&range(0, 500, 1400)), vec![500, 1000]);
        assert_eq!(remaining_offsets(&range(0, 500, 500)), Vec::<u64>::new());
        assert_eq!(remaining_offsets(&range(0, 0, 1001)), vec![500, 1000]);
        assert_eq!(remaining_offsets(&range(100, 100, 350)), vec![200, 300]);
    }

    #[tokio::test]
    async fn collects_in_offset_order() {
        let first = page(0, 1600);
        let all = collect_pages(first, |offset| async move { Ok(page(offset, 1600)) }, 2)
            .await
            .unwrap();
        let ids: Vec<i64> = all.items.iter().map(|u| u.id).collect();
        assert_eq!(ids, vec![0, 500, 1000, 1500]);
    }

    #[tokio::test]
    async fn first_error_is_returned() {
        let result = collect_pages(
            page(0, 1200),
            |offset| async move {
                if offset == 1000 {
                    Err(DracoonError::NotConnected)
                } else {
                    Ok(page(offset, 1200))
                }
            },
            DEFAULT_PAGE_CONCURRENCY,
        )
        .await;
        assert!(matches!(result, Err(DracoonError::NotConnected)));
    }

    #[test]
    fn blocking_collection() {
        let all = collect_pages_blocking(page(0, 900), |offset| Ok(page(offset, 900))).unwrap();
        assert_eq!(all.items.len(), 2);
    }
}
