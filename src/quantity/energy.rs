quantity!(WattHours, suffix: "Wh", precision: 0);
