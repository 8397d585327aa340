//! GraphQL documents sent to the storefront.

/// Fields every cart response selects.
const CART_FRAGMENT: &str = r#"
fragment CartFields on Cart {
  id
  checkoutUrl
  buyerIdentity { email customer { id } }
  cost {
    subtotalAmount { amount currencyCode }
    totalAmount { amount currencyCode }
    totalTaxAmount { amount currencyCode }
  }
  lines(first: 100) {
    edges {
      node {
        id
        quantity
        attributes { key value }
        cost { amountPerQuantity { amount currencyCode } }
        merchandise {
          ... on ProductVariant { id product { title } }
        }
      }
    }
  }
}
"#;

const USER_ERRORS: &str = "userErrors { field message }";

pub fn cart_query() -> String {
    format!(
        "query cart($id: ID!) {{ cart(id: $id) {{ ...CartFields }} }}\n{}",
        CART_FRAGMENT
    )
}

fn mutation(name: &str, params: &str, args: &str) -> String {
    format!(
        "mutation {name}({params}) {{ {name}({args}) {{ cart {{ ...CartFields }} {USER_ERRORS} }} }}\n{CART_FRAGMENT}"
    )
}

pub fn cart_create() -> String {
    mutation("cartCreate", "$input: CartInput", "input: $input")
}

pub fn lines_add() -> String {
    mutation(
        "cartLinesAdd",
        "$cartId: ID!, $lines: [CartLineInput!]!",
        "cartId: $cartId, lines: $lines",
    )
}

pub fn lines_update() -> String {
    mutation(
        "cartLinesUpdate",
        "$cartId: ID!, $lines: [CartLineUpdateInput!]!",
        "cartId: $cartId, lines: $lines",
    )
}

pub fn lines_remove() -> String {
    mutation(
        "cartLinesRemove",
        "$cartId: ID!, $lineIds: [ID!]!",
        "cartId: $cartId, lineIds: $lineIds",
    )
}

pub fn buyer_identity_update() -> String {
    mutation(
        "cartBuyerIdentityUpdate",
        "$cartId: ID!, $buyerIdentity: CartBuyerIdentityInput!",
        "cartId: $cartId, buyerIdentity: $buyerIdentity",
    )
}
