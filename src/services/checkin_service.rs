use std::sync::Arc;

use sea_orm::sea_query::Expr;
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::entities::{order_entity as orders, shift_entity as shifts};
use crate::error::{AppError, AppResult, OrderRejection};
use crate::events::{AppEvent, EventBroadcaster};
use crate::models::{OrderResponse, OrderStatus, UserRole};
use crate::services::order_rules;
use crate::utils::shift_window;
use crate::utils::Clock;

#[derive(Clone)]
pub struct CheckinService {
    pool: DatabaseConnection,
    clock: Arc<dyn Clock>,
    events: EventBroadcaster,
}

impl CheckinService {
    pub fn new(pool: DatabaseConnection, clock: Arc<dyn Clock>, events: EventBroadcaster) -> Self {
        Self {
            pool,
            clock,
            events,
        }
    }

    /// Redeem a pickup QR token. Status checks precede the time check; the
    /// final flip is conditional on the row still being ORDERED, so a
    /// concurrent sweep or cancellation loses exactly one of the races.
    pub async fn check_in(&self, qr_token: &str, actor_id: i64, actor_role: UserRole) -> AppResult<OrderResponse> {
        if !matches!(actor_role, UserRole::Kitchen | UserRole::Admin) {
            return Err(AppError::Forbidden);
        }

        let order = orders::Entity::find()
            .filter(orders::Column::QrToken.eq(qr_token))
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Order not found".into()))?;

        let shift = shifts::Entity::find_by_id(order.shift_id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound("Shift not found".into()))?;

        let now = self.clock.now();
        let window = shift_window::resolve(
            order.order_date,
            shift.start_time,
            shift.end_time,
            shift.break_times(),
            *now.offset(),
        );

        match order.status {
            OrderStatus::Ordered => {}
            OrderStatus::PickedUp => return Err(OrderRejection::AlreadyCheckedIn.into()),
            OrderStatus::Cancelled => return Err(OrderRejection::AlreadyCancelled.into()),
            // 已被扫单判为未取餐的订单等同于过了取餐窗口
            OrderStatus::NoShow => return Err(OrderRejection::CheckinTooLate(window.end).into()),
        }

        order_rules::check_pickup_window(&window, now)?;

        let result = orders::Entity::update_many()
            .col_expr(orders::Column::Status, Expr::value(OrderStatus::PickedUp))
            .col_expr(orders::Column::CheckInAt, Expr::value(Some(now.to_utc())))
            .col_expr(orders::Column::CheckedInBy, Expr::value(Some(actor_id)))
            .col_expr(orders::Column::UpdatedAt, Expr::value(Some(now.to_utc())))
            .filter(orders::Column::Id.eq(order.id))
            .filter(orders::Column::Status.eq(OrderStatus::Ordered))
            .exec(&self.pool)
            .await?;

        if result.rows_affected == 0 {
            // 输给并发的取消或扫单
            let current = orders::Entity::find_by_id(order.id)
                .one(&self.pool)
                .await?
                .ok_or_else(|| AppError::InternalError(format!("Order {} disappeared", order.id)))?;
            return Err(match current.status {
                OrderStatus::Cancelled => OrderRejection::AlreadyCancelled.into(),
                OrderStatus::PickedUp => OrderRejection::AlreadyCheckedIn.into(),
                _ => OrderRejection::CheckinTooLate(window.end).into(),
            });
        }

        let updated = orders::Entity::find_by_id(order.id)
            .one(&self.pool)
            .await?
            .ok_or_else(|| AppError::InternalError(format!("Order {} disappeared", order.id)))?;
        let response = OrderResponse::from(updated);
        self.events.emit(AppEvent::OrderCheckin {
            order: response.clone(),
        });
        Ok(response)
    }
}
