//! Seller notification dispatch over SMTP.
//!
//! One email per order line item; duplicate sellers get duplicate emails.
//! Dispatch is best-effort: a transport failure is logged and discarded, it
//! never affects the order that triggered it.

use async_trait::async_trait;
use lettre::{
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
    message::header::ContentType,
    transport::smtp::{Error as SmtpError, authentication::Credentials},
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use thiserror::Error;

use bazaar_core::{Email, OrderId, Price};

use crate::config::EmailConfig;

/// Errors that can occur when sending email.
#[derive(Debug, Error)]
pub enum EmailError {
    /// SMTP transport error.
    #[error("SMTP error: {0}")]
    Smtp(#[from] SmtpError),

    /// Failed to build email message.
    #[error("Failed to build message: {0}")]
    MessageBuild(#[from] lettre::error::Error),

    /// Invalid email address.
    #[error("Invalid email address: {0}")]
    InvalidAddress(String),
}

/// Everything needed to tell one seller about one ordered line item.
#[derive(Debug, Clone)]
pub struct SellerNotification {
    pub seller_name: String,
    pub seller_email: Email,
    pub product_title: String,
    pub product_description: String,
    pub product_price: Price,
    pub order_id: OrderId,
    pub customer_name: String,
    pub customer_email: Email,
    pub quantity: i32,
}

impl SellerNotification {
    /// The line total for the ordered quantity at the snapshot price.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.product_price.amount() * Decimal::from(self.quantity)
    }
}

/// Sends one seller notification. Implemented by the SMTP service and by
/// test doubles.
#[async_trait]
pub trait Notifier: Send + Sync {
    /// Send one notification email.
    async fn notify_seller(&self, notification: &SellerNotification) -> Result<(), EmailError>;
}

/// Email service backed by an async SMTP relay.
#[derive(Clone)]
pub struct EmailService {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from_address: String,
}

impl EmailService {
    /// Create a new email service from configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the SMTP relay cannot be configured.
    pub fn new(config: &EmailConfig) -> Result<Self, SmtpError> {
        let credentials = Credentials::new(
            config.smtp_username.clone(),
            config.smtp_password.expose_secret().to_string(),
        );

        let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)?
            .port(config.smtp_port)
            .credentials(credentials)
            .build();

        Ok(Self {
            mailer,
            from_address: config.from_address.clone(),
        })
    }
}

#[async_trait]
impl Notifier for EmailService {
    async fn notify_seller(&self, notification: &SellerNotification) -> Result<(), EmailError> {
        let (subject, body) = compose_seller_email(notification);

        let email = Message::builder()
            .from(
                self.from_address
                    .parse()
                    .map_err(|_| EmailError::InvalidAddress(self.from_address.clone()))?,
            )
            .to(notification
                .seller_email
                .as_str()
                .parse()
                .map_err(|_| {
                    EmailError::InvalidAddress(notification.seller_email.to_string())
                })?)
            .subject(&subject)
            .header(ContentType::TEXT_PLAIN)
            .body(body)?;

        self.mailer.send(email).await?;

        tracing::info!(
            to = %notification.seller_email,
            order_id = %notification.order_id,
            "Seller notification sent"
        );
        Ok(())
    }
}

/// Compose the subject and plain-text body for one seller notification.
#[must_use]
pub fn compose_seller_email(n: &SellerNotification) -> (String, String) {
    let subject = format!("New Order for Your Product: {}", n.product_title);
    let body = format!(
        "Hello {seller},\n\n\
         A customer has placed an order for your product.\n\n\
         Product details:\n\
         - Product: {title}\n\
         - Description: {description}\n\
         - Price: ${price}\n\n\
         Order details:\n\
         - Customer: {customer}\n\
         - Customer email: {customer_email}\n\
         - Order ID: {order_id}\n\
         - Quantity ordered: {qty}\n\
         - Total amount: ${total:.2}\n\n\
         Please prepare the item for shipment and contact the customer if needed.\n\
         Thank you for selling with Bazaar!\n",
        seller = n.seller_name,
        title = n.product_title,
        description = n.product_description,
        price = n.product_price,
        customer = n.customer_name,
        customer_email = n.customer_email,
        order_id = n.order_id,
        qty = n.quantity,
        total = n.line_total(),
    );
    (subject, body)
}

/// Send one notification per entry, swallowing failures.
///
/// Every entry is attempted regardless of earlier failures; each failure is
/// logged at `warn`. Returns the number of attempts made.
pub async fn notify_sellers(notifier: &dyn Notifier, batch: &[SellerNotification]) -> usize {
    let mut attempts = 0;
    for notification in batch {
        attempts += 1;
        if let Err(e) = notifier.notify_seller(notification).await {
            tracing::warn!(
                to = %notification.seller_email,
                order_id = %notification.order_id,
                error = %e,
                "Seller notification failed"
            );
        }
    }
    attempts
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    fn sample_notification(qty: i32) -> SellerNotification {
        SellerNotification {
            seller_name: "Sana".to_owned(),
            seller_email: Email::parse("sana@example.com").expect("valid"),
            product_title: "Running Shoes".to_owned(),
            product_description: "Barely worn".to_owned(),
            product_price: Price::parse("49.99").expect("valid"),
            order_id: OrderId::random(),
            customer_name: "Bilal".to_owned(),
            customer_email: Email::parse("bilal@example.com").expect("valid"),
            quantity: qty,
        }
    }

    /// Records recipients and fails on the indices it is told to.
    struct RecordingNotifier {
        sent_to: Mutex<Vec<String>>,
        fail_on: Vec<usize>,
    }

    impl RecordingNotifier {
        fn new(fail_on: Vec<usize>) -> Self {
            Self {
                sent_to: Mutex::new(Vec::new()),
                fail_on,
            }
        }
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify_seller(
            &self,
            notification: &SellerNotification,
        ) -> Result<(), EmailError> {
            let mut sent = self.sent_to.lock().expect("lock");
            let index = sent.len();
            sent.push(notification.seller_email.to_string());
            if self.fail_on.contains(&index) {
                return Err(EmailError::InvalidAddress("simulated failure".to_owned()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn every_entry_is_attempted() {
        let notifier = RecordingNotifier::new(vec![]);
        let batch = vec![sample_notification(1), sample_notification(2)];

        let attempts = notify_sellers(&notifier, &batch).await;

        assert_eq!(attempts, 2);
        assert_eq!(notifier.sent_to.lock().expect("lock").len(), 2);
    }

    #[tokio::test]
    async fn one_failure_does_not_stop_the_rest() {
        let notifier = RecordingNotifier::new(vec![0]);
        let batch = vec![sample_notification(1), sample_notification(3)];

        let attempts = notify_sellers(&notifier, &batch).await;

        // The first send failed, but the second was still attempted.
        assert_eq!(attempts, 2);
        assert_eq!(notifier.sent_to.lock().expect("lock").len(), 2);
    }

    #[tokio::test]
    async fn empty_batch_makes_no_attempts() {
        let notifier = RecordingNotifier::new(vec![]);
        assert_eq!(notify_sellers(&notifier, &[]).await, 0);
    }

    #[test]
    fn composed_email_mentions_product_order_and_totals() {
        let notification = sample_notification(3);
        let (subject, body) = compose_seller_email(&notification);

        assert_eq!(subject, "New Order for Your Product: Running Shoes");
        assert!(body.contains("Hello Sana"));
        assert!(body.contains("Running Shoes"));
        assert!(body.contains("bilal@example.com"));
        assert!(body.contains(&notification.order_id.to_string()));
        assert!(body.contains("Quantity ordered: 3"));
        // 3 x 49.99
        assert!(body.contains("Total amount: $149.97"));
    }

    #[test]
    fn line_total_multiplies_price_by_quantity() {
        let notification = sample_notification(2);
        assert_eq!(notification.line_total(), Decimal::new(9998, 2));
    }
}
