use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    domain::{cart::CartAction, order::OrderStatus, product::Category, user::Role},
    dto::{
        auth::{AccessTokenResponse, LoginRequest, LoginResponse, SignupRequest, UpdatePasswordRequest},
        cart::UpdateCartItemRequest,
        orders::{OrderList, OrderWithItems, PlaceOrderRequest, UpdateOrderStatusRequest},
        payment::{CreatePaymentOrderRequest, PaymentOrderResponse},
        products::{CreateProductRequest, ProductList, UpdateProductRequest},
        users::{UpdateProfileRequest, UpdateRoleRequest, UserList},
    },
    models::{Cart, CartItem, Order, OrderItem, Product, User},
    response::{ApiResponse, Meta},
    routes::{admin, auth, cart, health, orders, payment, products, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::signup,
        auth::login,
        auth::refresh,
        auth::logout,
        auth::update_password,
        users::get_profile,
        users::update_profile,
        users::list_users,
        users::update_role,
        products::list_products,
        products::search_products,
        products::get_product,
        products::create_product,
        products::update_product,
        products::delete_product,
        cart::get_cart,
        cart::update_cart_item,
        orders::place_order,
        orders::list_orders,
        orders::get_order,
        orders::cancel_order,
        admin::list_all_orders,
        admin::update_order_status,
        payment::create_payment_order
    ),
    components(
        schemas(
            Role,
            Category,
            CartAction,
            OrderStatus,
            User,
            Product,
            Cart,
            CartItem,
            Order,
            OrderItem,
            SignupRequest,
            LoginRequest,
            LoginResponse,
            AccessTokenResponse,
            UpdatePasswordRequest,
            UpdateProfileRequest,
            UpdateRoleRequest,
            UserList,
            CreateProductRequest,
            UpdateProductRequest,
            ProductList,
            UpdateCartItemRequest,
            PlaceOrderRequest,
            UpdateOrderStatusRequest,
            OrderList,
            OrderWithItems,
            CreatePaymentOrderRequest,
            PaymentOrderResponse,
            Meta,
            ApiResponse<User>,
            ApiResponse<Product>,
            ApiResponse<Cart>,
            ApiResponse<OrderWithItems>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Signup, login and token refresh"),
        (name = "Users", description = "Profiles and user administration"),
        (name = "Products", description = "Catalog"),
        (name = "Cart", description = "Per-user shopping cart"),
        (name = "Orders", description = "Order placement and lifecycle"),
        (name = "Admin", description = "Order administration"),
        (name = "Payment", description = "Payment gateway orders"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}
