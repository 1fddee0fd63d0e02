//! Route definitions for the Taskboard Platform

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::{
    handlers,
    middleware::{auth_middleware, require_admin},
    AppState,
};

/// Request body limit for multipart uploads
const MAX_UPLOAD_BYTES: usize = 20 * 1024 * 1024;

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        // Auth routes (mostly public)
        .nest("/auth", auth_routes(&state))
        // Protected routes - profile, lock panel, partner, wishlist, cart
        .nest("/user", user_routes(&state))
        // Protected routes - boards, lists, cards, invitations
        .nest("/board", board_routes(&state))
        // Protected routes - workspaces
        .nest("/w", workspace_routes(&state))
        // Car listings (public reads, owner writes)
        .nest("/car", car_routes(&state))
        // Admin-only catalogue management
        .nest("/admin", admin_routes(&state))
        // General routes
        .merge(general_routes(&state))
}

/// Authentication routes
fn auth_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/logout", post(handlers::logout))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/signup", post(handlers::signup))
        .route("/login", post(handlers::login))
        .route("/forgot-password", post(handlers::forgot_password))
        .route("/verify-otp", post(handlers::verify_otp))
        .route("/reset-password", post(handlers::reset_password))
        .merge(protected)
}

/// Account routes (protected)
fn user_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::get_profile))
        .route("/update", patch(handlers::update_profile))
        .route("/change-password", patch(handlers::change_password))
        // Lock panel
        .route("/lock/status", get(handlers::lock_status))
        .route("/lock/set", post(handlers::set_lock_pin))
        .route("/lock/change", post(handlers::change_lock_pin))
        .route("/lock/verify", post(handlers::verify_lock_pin))
        .route("/lock/disable", post(handlers::disable_lock_pin))
        // Partner
        .route("/register-partner", post(handlers::register_partner))
        // Wishlist
        .route("/wishlist", get(handlers::get_wishlist))
        .route(
            "/wishlist/:product_id",
            put(handlers::add_to_wishlist).delete(handlers::remove_from_wishlist),
        )
        // Cart
        .route(
            "/cart",
            get(handlers::get_cart)
                .put(handlers::add_to_cart)
                .patch(handlers::update_cart_item)
                .delete(handlers::remove_cart_item),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Board routes (protected)
fn board_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/new", post(handlers::create_board))
        .route("/all", get(handlers::list_boards))
        .route(
            "/:board_id",
            get(handlers::get_board)
                .patch(handlers::update_board)
                .delete(handlers::delete_board),
        )
        .route("/:board_id/close", patch(handlers::close_board))
        .route("/:board_id/reopen", patch(handlers::reopen_board))
        // Lists
        .route("/add-list", post(handlers::add_list))
        .route("/update-list/:list_id", patch(handlers::update_list))
        .route("/delete-list/:list_id", delete(handlers::delete_list))
        // Cards
        .route("/add-card", post(handlers::add_card))
        .route("/update-card/:card_id", patch(handlers::update_card))
        .route("/move-card/:card_id", patch(handlers::move_card))
        .route("/delete-card/:card_id", delete(handlers::delete_card))
        .route("/cards/:board_id", get(handlers::board_cards))
        .route("/card/:card_id", get(handlers::get_card))
        // Invite tokens
        .route(
            "/generate-invite-token/:board_id",
            post(handlers::generate_invite_token),
        )
        .route(
            "/delete-invite-token/:board_id",
            delete(handlers::delete_invite_token),
        )
        .route("/verify-invite-token", post(handlers::verify_invite_token))
        .route("/join-with-token", post(handlers::join_with_token))
        // Email invitations
        .route("/invite-member/:board_id", post(handlers::invite_member))
        .route("/accept-invite/:board_id", post(handlers::accept_invite))
        // Join requests
        .route("/request-join", post(handlers::request_join))
        .route("/request-status/:board_id", get(handlers::request_status))
        .route(
            "/join-request/:request_id/respond",
            post(handlers::respond_join_request),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Workspace routes (protected)
fn workspace_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/new", post(handlers::create_workspace))
        .route(
            "/:workspace_id",
            get(handlers::get_workspace)
                .put(handlers::update_workspace)
                .delete(handlers::delete_workspace),
        )
        .route("/:workspace_id/members", get(handlers::workspace_members))
        .route("/:workspace_id/leave", delete(handlers::leave_workspace))
        .route(
            "/:workspace_id/remove-member",
            delete(handlers::remove_workspace_member),
        )
        .route(
            "/:workspace_id/invitation",
            post(handlers::create_invitation)
                .get(handlers::get_invitation)
                .delete(handlers::delete_invitations),
        )
        .route(
            "/:workspace_id/invitation/:token",
            get(handlers::preview_invitation).post(handlers::accept_invitation),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// Car listing routes
fn car_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/", post(handlers::create_car))
        .route("/mine", get(handlers::my_cars))
        .route("/:car_id", patch(handlers::update_car))
        .route("/:car_id/status", patch(handlers::set_car_status))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/", get(handlers::search_cars))
        .route("/:car_id", get(handlers::get_car))
        .merge(protected)
}

/// Catalogue management routes (admin only)
fn admin_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route("/add-product", post(handlers::create_product))
        .route(
            "/product/:product_id",
            patch(handlers::update_product).delete(handlers::delete_product),
        )
        .route("/product/:product_id/status", patch(handlers::set_product_status))
        .route("/add-category", post(handlers::create_category))
        .route("/category/:category_id", patch(handlers::update_category))
        .route("/categories", get(handlers::category_tree))
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware))
}

/// General routes: public catalogue reads plus protected notifications,
/// comments, meetings and uploads
fn general_routes(state: &AppState) -> Router<AppState> {
    let protected = Router::new()
        // Notifications
        .route("/notifications", get(handlers::list_notifications))
        .route("/notification/read", post(handlers::mark_notification_read))
        // Comments
        .route("/add-comment", post(handlers::add_comment))
        .route("/delete-comment", delete(handlers::delete_comment))
        .route("/react-comment", post(handlers::react_comment))
        // Meetings
        .route("/meeting", post(handlers::create_meeting))
        .route("/meetings", get(handlers::list_meetings))
        .route("/video-token", get(handlers::video_token))
        // Media
        .route(
            "/upload-single",
            post(handlers::upload_single).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route(
            "/upload-multiple",
            post(handlers::upload_multiple).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/products", get(handlers::list_products))
        .route("/product/:product_id", get(handlers::get_product))
        .route("/categories", get(handlers::category_tree))
        .merge(protected)
}
