//! Static shop content: product catalog, persona instructions and the
//! canned assistant lines. Built once at startup and shared read-only.

use minijinja::{context, Environment};

use crate::conversation::Message;

pub const PRODUCT_LIST: &str = r#"
# 패션샵 제품 목록

## 남성 의류:
- 티셔츠
  - 가격: 20 달러
  - 사이즈: Small, Medium, Large, XL
  - 가능한 색상: 그린, 화이트, 블랙, 그레이, 네이비

- 청바지
  - 가격: 50 달러
  - 사이즈: Small, Medium, Large, XL
  - 가능한 색상: 블루, 블랙, 그레이, 네이비

## 여성 의류:
- 티셔츠
  - 가격: 20 달러
  - 사이즈: Small, Medium, Large, XL
  - 가능한 색상: 레드, 화이트, 블랙, 그레이, 네이비

- 드레스
  - 가격: 50 달러
  - 사이즈: Small, Medium, Large, XL
  - 가능한 색상: 레드, 화이트, 블랙, 그레이, 네이비
"#;

const PERSONA_TEMPLATE: &str = r#"
당신은 온라인 패션 상점 {{ shop_name }}의 AI 어시스턴트인 {{ bot_name }}입니다.

당신의 역할은 고객을 응대하고, 고객이 원하는 제품을 찾도록 재고 목록을 참고하여 정보를 제공하며, 구매 과정을 안내하는 것입니다.

**반드시** 고객이 사용하는 언어에 맞춰서 응답해야 합니다. 만약 고객이 한국어로 메시지를 보냈다면, 반드시 한국어로 응답해야 합니다. 한국어와 영어 이외 다른 언어는 사용하지 마세요.

저희 상점에서는 현재 남성 의류와 여성 의류를 판매하고 있습니다.

전체 재고 목록은 다음과 같습니다:

```{{ product_list }}```

**환영 인사는 처음 한 번만 합니다. 이미 고객에게 인사 메시지를 보여준 상태이므로, 고객이 '안녕하세요' 등으로 인사를 하더라도 똑같이 인사를 하지 말고, 바로 찾고 있는 제품이 있는지 물어보세요.**

고객의 메시지에는 항상 친절하게 답변해야 합니다.
"#;

pub const GREETINGS: &str = "반갑습니다, 고객님.

Trendy Fashion에 오신 것을 환영합니다.

저는 이 상점의 AI 어시스턴트인 ShopBot입니다.

어떤 상품을 찾고 계신가요?

남성분들을 위한 👕티셔츠와 👖청바지, 여성분들을 위한 👚티셔츠와 👗드레스가 준비되어 있습니다.

궁금한 점이 있거나 도움이 필요하면 언제든지 저에게 알려주세요.
";

/// Reply used when the shopper greets again after the first greeting.
pub const HOW_CAN_I_HELP: &str = "무엇을 도와드릴까요?";

pub const SHOP_NAME: &str = "Trendy Fashion";
pub const BOT_NAME: &str = "ShopBot";

/// Persona and catalog, prepended to every completion request.
#[derive(Debug, Clone, PartialEq)]
pub struct StaticContext {
    persona: String,
    catalog: String,
    greeting: String,
}

impl StaticContext {
    /// Renders the persona with `catalog` embedded.
    pub fn new(catalog: &str, greeting: &str) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template("persona", PERSONA_TEMPLATE)?;
        let persona = env.get_template("persona")?.render(context! {
            shop_name => SHOP_NAME,
            bot_name => BOT_NAME,
            product_list => catalog,
        })?;

        Ok(Self {
            persona,
            catalog: catalog.to_string(),
            greeting: greeting.to_string(),
        })
    }

    /// The Trendy Fashion catalog and greeting.
    pub fn trendy_fashion() -> Result<Self, minijinja::Error> {
        Self::new(PRODUCT_LIST, GREETINGS)
    }

    pub fn persona(&self) -> &str {
        &self.persona
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Messages sent ahead of the session log on every model call:
    /// the system persona, then the opening greeting.
    pub fn prefix(&self) -> [Message; 2] {
        [
            Message::system(self.persona.clone()),
            Message::assistant(self.greeting.clone()),
        ]
    }
}
