// SPDX-FileCopyrightText: 2026 Marhaba Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pre-translated reply templates in English and Arabic.
//!
//! Templates use `{placeholder}` substitution. Arabish (Mixed) users get the
//! English templates since they write in Latin script.

use marhaba_core::types::Language;

/// The closed set of canned replies the pipeline can send.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateKey {
    Greeting,
    VipGreeting,
    PropertyRedirect,
    ConfirmTicket,
    TicketCreated,
    TicketStatus,
    TicketUpdated,
    TicketClosed,
    TicketList,
    RequestTicketKey,
    Cancelled,
    NewIssueAck,
    Error,
}

/// Renders templates for the user's language.
#[derive(Debug, Clone)]
pub struct Templates {
    business_email: String,
    business_website: String,
}

impl Templates {
    pub fn new(business_email: &str, business_website: &str) -> Self {
        Self {
            business_email: business_email.to_string(),
            business_website: business_website.to_string(),
        }
    }

    /// Render a template, substituting `{placeholder}` values.
    ///
    /// The business contact placeholders `{email}` and `{website}` are always
    /// available; callers pass the rest.
    pub fn render(&self, key: TemplateKey, language: Language, values: &[(&str, &str)]) -> String {
        let mut text = template_text(key, language).to_string();
        for (name, value) in values {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text = text.replace("{email}", &self.business_email);
        text.replace("{website}", &self.business_website)
    }
}

fn template_text(key: TemplateKey, language: Language) -> &'static str {
    // Mixed-script users read Latin text, so they get English.
    let arabic = language == Language::Arabic;
    match key {
        TemplateKey::Greeting => {
            if arabic {
                "مرحباً {name}! 👋\n\nأنا مساعدك في سوذبيز ريلتي دبي. كيف يمكنني مساعدتك اليوم؟"
            } else {
                "Hello {name}! 👋\n\nI'm your Sotheby's Realty Dubai assistant. How can I help you today?"
            }
        }
        TemplateKey::VipGreeting => {
            if arabic {
                "👑 مرحباً {name}!\n\nيسعدنا خدمتك. أنت من عملائنا المميزين VIP.\n\nكيف يمكنني مساعدتك اليوم؟"
            } else {
                "👑 Welcome {name}!\n\nDelighted to serve you. You're our valued VIP client.\n\nHow can I assist you today?"
            }
        }
        TemplateKey::PropertyRedirect => {
            if arabic {
                "شكراً لاهتمامك! 🏠\n\nللاستفسارات عن العقارات والأسعار والمعاينات، يرجى التواصل مع فريق المبيعات:\n\n📧 البريد: {email}\n🌐 الموقع: {website}\n\nهل يمكنني مساعدتك في شيء آخر؟"
            } else {
                "Thank you for your interest! 🏠\n\nFor property inquiries, pricing, and viewings, please contact our sales team:\n\n📧 Email: {email}\n🌐 Website: {website}\n\nCan I help you with anything else?"
            }
        }
        TemplateKey::ConfirmTicket => {
            if arabic {
                "📝 *معاينة التذكرة*\n\n*الملخص:* {summary}\n*الفريق:* {team}\n*الأولوية:* {priority}\n\nرد بـ \"نعم\" لإنشاء التذكرة أو صِف أي تغييرات مطلوبة."
            } else {
                "📝 *Ticket Preview*\n\n*Summary:* {summary}\n*Team:* {team}\n*Priority:* {priority}\n\nReply \"Yes\" to create this ticket or describe any changes."
            }
        }
        TemplateKey::TicketCreated => {
            if arabic {
                "✅ تم إنشاء التذكرة بنجاح\n\n*رقم التذكرة:* {ticket_key}\n*الملخص:* {summary}\n\nسنقوم بإعلامك عند التحديثات. شكراً لك!"
            } else {
                "✅ Ticket Created Successfully\n\n*Ticket ID:* {ticket_key}\n*Summary:* {summary}\n\nWe'll notify you with updates. Thank you!"
            }
        }
        TemplateKey::TicketStatus => {
            if arabic {
                "📊 *حالة التذكرة - {ticket_key}*\n\n*الملخص:* {summary}\n*الحالة:* {status}\n*الأولوية:* {priority}\n*المسؤول:* {assignee}\n\nرابط التفاصيل:\n{url}"
            } else {
                "📊 *Ticket Status - {ticket_key}*\n\n*Summary:* {summary}\n*Status:* {status}\n*Priority:* {priority}\n*Assignee:* {assignee}\n\nDetails:\n{url}"
            }
        }
        TemplateKey::TicketUpdated => {
            if arabic {
                "✅ تم تحديث التذكرة {ticket_key}.\n\nسيراجع الفريق المعلومات الإضافية. شكراً لك!"
            } else {
                "✅ Ticket {ticket_key} has been updated.\n\nThe team will review the additional information. Thank you!"
            }
        }
        TemplateKey::TicketClosed => {
            if arabic {
                "✅ تم إغلاق التذكرة {ticket_key}.\n\nيسعدنا مساعدتك في أي وقت!"
            } else {
                "✅ Ticket {ticket_key} has been closed.\n\nHappy to help anytime!"
            }
        }
        TemplateKey::TicketList => {
            if arabic {
                "📋 *تذاكرك الأخيرة:*\n\n{tickets}\n\nأرسل رقم التذكرة لمعرفة التفاصيل."
            } else {
                "📋 *Your recent tickets:*\n\n{tickets}\n\nSend a ticket number for details."
            }
        }
        TemplateKey::RequestTicketKey => {
            if arabic {
                "لم أجد تذاكر مرتبطة برقمك. يرجى إرسال رقم التذكرة (مثال: SUP-123)."
            } else {
                "I couldn't find any tickets linked to your number. Please send the ticket number (e.g. SUP-123)."
            }
        }
        TemplateKey::Cancelled => {
            if arabic {
                "تم إلغاء إنشاء التذكرة. كيف يمكنني مساعدتك؟"
            } else {
                "Ticket creation cancelled. How else can I help you?"
            }
        }
        TemplateKey::NewIssueAck => {
            if arabic {
                "حسناً! دعني أساعدك في هذه المشكلة الجديدة."
            } else {
                "Got it! Let me help with this new issue."
            }
        }
        TemplateKey::Error => {
            if arabic {
                "عذراً، حدث خطأ. يرجى المحاولة مرة أخرى أو التواصل مع الدعم."
            } else {
                "Sorry, an error occurred. Please try again or contact support."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn templates() -> Templates {
        Templates::new("sales@example.com", "https://example.com")
    }

    #[test]
    fn substitutes_placeholders() {
        let text = templates().render(
            TemplateKey::TicketCreated,
            Language::English,
            &[("ticket_key", "SUP-42"), ("summary", "Sync broken")],
        );
        assert!(text.contains("SUP-42"));
        assert!(text.contains("Sync broken"));
        assert!(!text.contains('{'));
    }

    #[test]
    fn property_redirect_includes_business_contacts() {
        let text = templates().render(TemplateKey::PropertyRedirect, Language::English, &[]);
        assert!(text.contains("sales@example.com"));
        assert!(text.contains("https://example.com"));
    }

    #[test]
    fn arabic_templates_are_arabic() {
        let text = templates().render(
            TemplateKey::Greeting,
            Language::Arabic,
            &[("name", "أحمد")],
        );
        assert!(text.contains("مرحباً"));
        assert!(text.contains("أحمد"));
    }

    #[test]
    fn mixed_language_uses_english() {
        let en = templates().render(TemplateKey::Cancelled, Language::English, &[]);
        let mixed = templates().render(TemplateKey::Cancelled, Language::Mixed, &[]);
        assert_eq!(en, mixed);
    }
}
