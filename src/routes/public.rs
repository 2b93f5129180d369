use crate::router::{Props, QueryParams, RouteNode, View};

/// Public Route Subtree
///
/// Pages reachable without a session: login, e-mail confirmation and deletion,
/// password reset and registration. Mounted at `/`.
///
/// Children use absolute paths, so they resolve to `/confirm`, `/newuser`, ... and
/// not to nested locations. The header shell and the default `Login` page ship with
/// the initial bundle; the rest are fetched on first visit.
pub fn public_routes() -> RouteNode {
    RouteNode::new(
        "/",
        "PublicHeaders",
        View::eager("PublicHeaders", "views/PublicHeaders"),
    )
    .children(vec![
        // /
        // Default child, rendered inside the public header shell.
        RouteNode::new("", "Login", View::eager("Login", "views/public/Login")),
        // /confirm
        // Shown after registration, asks the user to check their inbox.
        RouteNode::new(
            "/confirm",
            "ConfirmEmail",
            View::lazy("ConfirmEmail", "views/public/ConfirmEmail"),
        ),
        // /confirm-email?token=...
        // Landing page of the confirmation link.
        RouteNode::new(
            "/confirm-email",
            "EmailConfirmed",
            View::lazy("EmailConfirmed", "views/public/EmailConfirmed"),
        )
        .props(token_prop),
        // /delete-email?token=...
        // Landing page of the "this wasn't me" link.
        RouteNode::new(
            "/delete-email",
            "DeleteEmail",
            View::lazy("DeleteEmail", "views/public/DeleteEmail"),
        )
        .props(token_prop),
        // /forgotpass
        RouteNode::new(
            "/forgotpass",
            "ForgotPassword",
            View::lazy("ForgotPassword", "views/public/ForgotPassword"),
        ),
        // /newuser
        RouteNode::new(
            "/newuser",
            "NewUser",
            View::lazy("NewUser", "views/public/NewUser"),
        ),
    ])
}

/// `token` query parameter, passed to the e-mail confirmation and deletion pages.
pub fn token_prop(query: &QueryParams) -> Props {
    Props::new().with("token", query.first("token"))
}
