// shopflow_server/src/services/email_notifier.rs

//! Renders customer emails and hands them to the log. Delivery through a real
//! mail provider is out of scope; the rendered text is what would be sent.

use async_trait::async_trait;
use shopflow::notify::Notifier;
use shopflow::order::Order;
use shopflow::Result;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RenderedEmail {
  pub to: String,
  pub from: String,
  pub subject: String,
  pub body: String,
}

#[derive(Debug, Clone)]
pub struct EmailNotifier {
  sender: String,
}

impl EmailNotifier {
  pub fn new(sender: impl Into<String>) -> Self {
    Self { sender: sender.into() }
  }

  pub fn render_order_placed(&self, order: &Order) -> RenderedEmail {
    let mut body = format!(
      "Hi {},\n\nThank you for your order {}.\n\n",
      order.customer_details.name, order.order_code
    );
    for item in &order.items {
      body.push_str(&format!("  {} x{}  {}\n", item.name, item.quantity, item.line_total));
    }
    body.push_str(&format!(
      "\nShipping: {}\nDiscount: {}\nCoupon discount: {}\nTotal: {}\nPayment method: {}\n",
      order.payment.shipping_charge,
      order.payment.discount_amount,
      order.payment.coupon_discount_amount,
      order.payment.total_amount,
      order.payment.payment_method.as_str(),
    ));
    RenderedEmail {
      to: order.customer_details.email.clone(),
      from: self.sender.clone(),
      subject: format!("Order {} received", order.order_code),
      body,
    }
  }

  pub fn render_payment_confirmed(&self, order: &Order) -> RenderedEmail {
    let body = format!(
      "Hi {},\n\nWe received your payment of {} for order {}. We will let you know once it ships.\n",
      order.customer_details.name, order.payment.total_amount, order.order_code
    );
    RenderedEmail {
      to: order.customer_details.email.clone(),
      from: self.sender.clone(),
      subject: format!("Payment confirmed for {}", order.order_code),
      body,
    }
  }

  async fn deliver(&self, email: RenderedEmail) -> Result<()> {
    let message_id = format!("email_{}", Uuid::new_v4().simple());
    info!(
      to = %email.to,
      from = %email.from,
      subject = %email.subject,
      %message_id,
      body = %email.body,
      "Email dispatched."
    );
    Ok(())
  }
}

#[async_trait]
impl Notifier for EmailNotifier {
  #[instrument(name = "notify::order_placed", skip_all, fields(order_code = %order.order_code))]
  async fn order_placed(&self, order: &Order) -> Result<()> {
    self.deliver(self.render_order_placed(order)).await
  }

  #[instrument(name = "notify::payment_confirmed", skip_all, fields(order_code = %order.order_code))]
  async fn payment_confirmed(&self, order: &Order) -> Result<()> {
    self.deliver(self.render_payment_confirmed(order)).await
  }
}
