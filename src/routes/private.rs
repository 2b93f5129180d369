use crate::router::{Props, QueryParams, RouteNode, View};

/// Private Route Subtree
///
/// Pages for a signed-in user, all nested under `/user`. This node is the single
/// point where a session guard attaches: it is marked `guarded`, and every child
/// inherits `requires_session`. The table does not check the session itself.
///
/// Every view here, the header shell included, is fetched on first visit.
pub fn private_routes() -> RouteNode {
    RouteNode::new(
        "/user",
        "PrivateHeaders",
        View::lazy("PrivateHeaders", "views/PrivateHeaders"),
    )
    .guarded()
    .children(vec![
        // /user/settings
        RouteNode::new(
            "settings",
            "UserSettings",
            View::lazy("UserSettings", "views/private/UserSettings"),
        ),
        // /user/unread
        // Live list of unread articles, fed by the `/api/article/feed` socket.
        RouteNode::new("unread", "Unread", View::lazy("Unread", "views/private/Unread")),
        // /user/feeds
        RouteNode::new(
            "feeds",
            "FeedList",
            View::lazy("FeedList", "views/private/FeedList"),
        ),
        // /user/feed-details?id=...
        RouteNode::new(
            "feed-details",
            "FeedDetails",
            View::lazy("FeedDetails", "views/private/FeedDetails"),
        )
        .props(feed_id_prop),
        // /user/logout
        RouteNode::new("logout", "Logout", View::lazy("Logout", "views/private/Logout")),
    ])
}

/// `id` query parameter, the feed shown by `FeedDetails`.
pub fn feed_id_prop(query: &QueryParams) -> Props {
    Props::new().with("id", query.first("id"))
}
