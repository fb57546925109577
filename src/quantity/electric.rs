quantity!(Volts, suffix: "V", precision: 1);
quantity!(Hertz, suffix: "Hz", precision: 2);
